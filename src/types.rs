//! Core data types for boxes, detections and evaluation samples.

use serde::{Deserialize, Serialize};

use crate::error::{DetBoxError, Result};

/// Class id reserved for background / "no object".
pub const BACKGROUND_CLASS: usize = 0;

/// A box in point-form (x_min, y_min, x_max, y_max).
///
/// Serialized as a plain `[x_min, y_min, x_max, y_max]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PointBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl PointBox {
    /// Create a new point-form box.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Box width. Negative or zero for degenerate boxes.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Box height. Negative or zero for degenerate boxes.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Signed area, `width * height`.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if the box has positive width and height.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Convert to center-form.
    pub fn to_center_form(&self) -> CenterBox {
        CenterBox {
            center_x: (self.x_min + self.x_max) / 2.0,
            center_y: (self.y_min + self.y_max) / 2.0,
            width: self.width(),
            height: self.height(),
        }
    }

    /// Copy of the box with `amount` added to the max corner.
    ///
    /// Used to treat coordinates as inclusive integer pixel bounds.
    pub fn widened(&self, amount: f64) -> Self {
        Self {
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
            ..*self
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl From<[f64; 4]> for PointBox {
    fn from(coordinates: [f64; 4]) -> Self {
        Self::new(coordinates[0], coordinates[1], coordinates[2], coordinates[3])
    }
}

impl From<PointBox> for [f64; 4] {
    fn from(point_box: PointBox) -> Self {
        point_box.to_array()
    }
}

/// A box in center-form (center_x, center_y, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct CenterBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CenterBox {
    /// Create a new center-form box.
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self { center_x, center_y, width, height }
    }

    /// Convert to point-form.
    pub fn to_point_form(&self) -> PointBox {
        PointBox {
            x_min: self.center_x - self.width / 2.0,
            y_min: self.center_y - self.height / 2.0,
            x_max: self.center_x + self.width / 2.0,
            y_max: self.center_y + self.height / 2.0,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.center_x, self.center_y, self.width, self.height]
    }
}

impl From<[f64; 4]> for CenterBox {
    fn from(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl From<CenterBox> for [f64; 4] {
    fn from(center_box: CenterBox) -> Self {
        center_box.to_array()
    }
}

/// A point-form box carrying a class label.
///
/// This is the row layout shared by ground-truth boxes and matcher output:
/// `[x_min, y_min, x_max, y_max, class_id]`. Class 0 is background.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "[f64; 5]", into = "[f64; 5]")]
pub struct LabeledBox {
    pub coordinates: PointBox,
    pub class_id: usize,
}

impl LabeledBox {
    pub fn new(coordinates: PointBox, class_id: usize) -> Self {
        Self { coordinates, class_id }
    }

    /// Background record with zeroed coordinates.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn is_background(&self) -> bool {
        self.class_id == BACKGROUND_CLASS
    }

    /// Parse a `[x_min, y_min, x_max, y_max, class]` row.
    ///
    /// # Errors
    ///
    /// Returns an error if the class column is negative, fractional or not finite.
    pub fn from_row(row: [f64; 5]) -> Result<Self> {
        let class = row[4];
        if !class.is_finite() || class < 0.0 || class.fract() != 0.0 {
            return Err(DetBoxError::InvalidAnnotation(format!(
                "class label must be a non-negative integer, got {class}"
            )));
        }
        Ok(Self::new(
            PointBox::new(row[0], row[1], row[2], row[3]),
            class as usize,
        ))
    }

    pub fn to_row(&self) -> [f64; 5] {
        let [x_min, y_min, x_max, y_max] = self.coordinates.to_array();
        [x_min, y_min, x_max, y_max, self.class_id as f64]
    }
}

impl TryFrom<[f64; 5]> for LabeledBox {
    type Error = DetBoxError;

    fn try_from(row: [f64; 5]) -> Result<Self> {
        Self::from_row(row)
    }
}

impl From<LabeledBox> for [f64; 5] {
    fn from(labeled: LabeledBox) -> Self {
        labeled.to_row()
    }
}

/// Regression target for one prior: `[Δcx, Δcy, log-Δw, log-Δh]` plus the class label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EncodedBox {
    pub offsets: [f64; 4],
    pub class_id: usize,
}

impl EncodedBox {
    pub fn new(offsets: [f64; 4], class_id: usize) -> Self {
        Self { offsets, class_id }
    }
}

/// A detection reported by an external detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Predicted box in point-form
    pub coordinates: PointBox,
    /// Name of the predicted class, resolved through a class map
    pub class_name: String,
    /// Confidence score in [0, 1]
    pub score: f64,
}

impl Detection {
    pub fn new(coordinates: PointBox, class_name: impl Into<String>, score: f64) -> Self {
        Self {
            coordinates,
            class_name: class_name.into(),
            score,
        }
    }
}

/// A detection whose class name has been resolved to a class id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    pub coordinates: PointBox,
    pub class_id: usize,
    pub score: f64,
}

impl ScoredBox {
    pub fn new(coordinates: PointBox, class_id: usize, score: f64) -> Self {
        Self {
            coordinates,
            class_id,
            score,
        }
    }
}

/// One dataset entry: the detector input plus its ground truth.
#[derive(Debug, Clone)]
pub struct Sample<I> {
    /// Whatever the detector consumes (an image, a path, recorded detections...)
    pub image: I,
    /// Ground-truth boxes, class ids in [1, num_classes]
    pub boxes: Vec<LabeledBox>,
    /// Optional per-box "difficult" flags, aligned with `boxes`
    pub difficulties: Option<Vec<bool>>,
}

impl<I> Sample<I> {
    pub fn new(image: I, boxes: Vec<LabeledBox>) -> Self {
        Self {
            image,
            boxes,
            difficulties: None,
        }
    }

    pub fn with_difficulties(mut self, difficulties: Vec<bool>) -> Self {
        self.difficulties = Some(difficulties);
        self
    }

    /// Difficulty flags, defaulting to all-false when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the flags are not aligned with the boxes.
    pub fn resolved_difficulties(&self) -> Result<Vec<bool>> {
        match &self.difficulties {
            None => Ok(vec![false; self.boxes.len()]),
            Some(flags) if flags.len() == self.boxes.len() => Ok(flags.clone()),
            Some(flags) => Err(DetBoxError::ShapeMismatch(format!(
                "{} difficulty flags for {} ground-truth boxes",
                flags.len(),
                self.boxes.len()
            ))),
        }
    }
}
