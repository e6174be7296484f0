//! Regression target encoding and decoding relative to prior boxes.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::validate_iou_threshold;
use crate::error::{DetBoxError, Result};
use crate::matcher::match_priors;
use crate::priors::PriorBoxes;
use crate::types::{CenterBox, EncodedBox, LabeledBox, PointBox};

/// Added to the size ratio before taking its logarithm.
pub const LOG_EPSILON: f64 = 1e-4;

/// Scaling applied to the center offsets and to the log size ratios.
///
/// Serialized as `[center, size]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Variances {
    center: f64,
    size: f64,
}

impl Variances {
    /// # Errors
    ///
    /// Returns an error unless both values are finite and positive.
    pub fn new(center: f64, size: f64) -> Result<Self> {
        for (name, value) in [("center", center), ("size", size)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DetBoxError::InvalidVariances(format!(
                    "{name} variance must be positive, got {value}"
                )));
            }
        }
        Ok(Self { center, size })
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn size(&self) -> f64 {
        self.size
    }
}

impl Default for Variances {
    fn default() -> Self {
        Self { center: 0.1, size: 0.2 }
    }
}

impl TryFrom<[f64; 2]> for Variances {
    type Error = DetBoxError;

    fn try_from(values: [f64; 2]) -> Result<Self> {
        Self::new(values[0], values[1])
    }
}

impl From<Variances> for [f64; 2] {
    fn from(variances: Variances) -> Self {
        [variances.center, variances.size]
    }
}

fn check_aligned(len: usize, priors: &PriorBoxes, what: &str) -> Result<()> {
    if len != priors.len() {
        return Err(DetBoxError::ShapeMismatch(format!(
            "{len} {what} for {} priors",
            priors.len()
        )));
    }
    Ok(())
}

/// Encode matched point-form boxes as offsets from their priors.
///
/// Center offsets are normalized by the prior size and `variances.center()`,
/// sizes become `ln(|matched / prior| + 1e-4) / variances.size()`. Class
/// labels pass through unchanged.
///
/// # Errors
///
/// Returns an error if `matched` is not aligned with `priors`.
pub fn encode(matched: &[LabeledBox], priors: &PriorBoxes, variances: &Variances) -> Result<Vec<EncodedBox>> {
    check_aligned(matched.len(), priors, "matched boxes")?;
    Ok(encode_aligned(matched, priors, variances))
}

fn encode_aligned(matched: &[LabeledBox], priors: &PriorBoxes, variances: &Variances) -> Vec<EncodedBox> {
    matched
        .iter()
        .zip(priors.center_form())
        .map(|(labeled, prior)| {
            let target = labeled.coordinates.to_center_form();
            let offsets = [
                (target.center_x - prior.center_x) / (variances.center * prior.width),
                (target.center_y - prior.center_y) / (variances.center * prior.height),
                ((target.width / prior.width).abs() + LOG_EPSILON).ln() / variances.size,
                ((target.height / prior.height).abs() + LOG_EPSILON).ln() / variances.size,
            ];
            EncodedBox::new(offsets, labeled.class_id)
        })
        .collect()
}

/// Decode predicted offsets back into point-form boxes.
///
/// The center-form box is rebuilt from the prior first; `(x_min, y_min)` is
/// then `center - size / 2` and `(x_max, y_max)` is `(x_min, y_min) + size`.
///
/// # Errors
///
/// Returns an error if `predictions` is not aligned with `priors`.
pub fn decode(predictions: &[EncodedBox], priors: &PriorBoxes, variances: &Variances) -> Result<Vec<LabeledBox>> {
    check_aligned(predictions.len(), priors, "predictions")?;

    Ok(predictions
        .iter()
        .zip(priors.center_form())
        .map(|(prediction, prior)| {
            let [dx, dy, dw, dh] = prediction.offsets;
            let decoded = CenterBox::new(
                prior.center_x + dx * variances.center * prior.width,
                prior.center_y + dy * variances.center * prior.height,
                prior.width * (dw * variances.size).exp(),
                prior.height * (dh * variances.size).exp(),
            );
            let x_min = decoded.center_x - decoded.width / 2.0;
            let y_min = decoded.center_y - decoded.height / 2.0;
            let coordinates = PointBox::new(x_min, y_min, x_min + decoded.width, y_min + decoded.height);
            LabeledBox::new(coordinates, prediction.class_id)
        })
        .collect())
}

/// One-hot encode class indices into a `class_ids.len() x num_classes` matrix.
///
/// # Errors
///
/// Returns an error if any class index is not below `num_classes`.
///
/// # Example
///
/// ```
/// use detbox::codec::to_one_hot;
///
/// let one_hot = to_one_hot(&[0, 2], 3).unwrap();
/// assert_eq!(one_hot.row(1).to_vec(), vec![0.0, 0.0, 1.0]);
/// ```
pub fn to_one_hot(class_ids: &[usize], num_classes: usize) -> Result<Array2<f64>> {
    let mut one_hot = Array2::zeros((class_ids.len(), num_classes));
    for (row, &class_id) in class_ids.iter().enumerate() {
        if class_id >= num_classes {
            return Err(DetBoxError::InvalidAnnotation(format!(
                "class index {class_id} out of range for {num_classes} classes"
            )));
        }
        one_hot[[row, class_id]] = 1.0;
    }
    Ok(one_hot)
}

/// Training-target builder bound to one model's prior layout.
///
/// Holding priors, variances and the match threshold together keeps target
/// encoding and inference decoding on the same configuration.
#[derive(Debug, Clone)]
pub struct TargetEncoder {
    priors: PriorBoxes,
    variances: Variances,
    iou_threshold: f64,
}

impl TargetEncoder {
    /// # Errors
    ///
    /// Returns an error if `iou_threshold` is not in [0, 1].
    pub fn new(priors: PriorBoxes, variances: Variances, iou_threshold: f64) -> Result<Self> {
        validate_iou_threshold(iou_threshold)?;
        Ok(Self {
            priors,
            variances,
            iou_threshold,
        })
    }

    pub fn priors(&self) -> &PriorBoxes {
        &self.priors
    }

    pub fn variances(&self) -> &Variances {
        &self.variances
    }

    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    /// Match one image's ground truth to the priors and encode the result.
    pub fn encode_targets(&self, boxes: &[LabeledBox]) -> Vec<EncodedBox> {
        let matched = match_priors(boxes, &self.priors, self.iou_threshold);
        encode_aligned(&matched, &self.priors, &self.variances)
    }

    /// Decode one image's predicted offsets into point-form boxes.
    pub fn decode_predictions(&self, predictions: &[EncodedBox]) -> Result<Vec<LabeledBox>> {
        decode(predictions, &self.priors, &self.variances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priors() -> PriorBoxes {
        PriorBoxes::from_rows(&[[0.5, 0.5, 0.4, 0.2], [0.2, 0.3, 0.1, 0.3]]).unwrap()
    }

    #[test]
    fn test_encode_prior_itself_is_near_zero() {
        let priors = priors();
        let matched: Vec<LabeledBox> = priors
            .point_form()
            .iter()
            .map(|coordinates| LabeledBox::new(*coordinates, 1))
            .collect();

        let encoded = encode(&matched, &priors, &Variances::default()).unwrap();
        for target in &encoded {
            assert!(target.offsets[0].abs() < 1e-9);
            assert!(target.offsets[1].abs() < 1e-9);
            // ln(1 + 1e-4) / 0.2
            assert!((target.offsets[2] - (1.0f64 + 1e-4).ln() / 0.2).abs() < 1e-9);
            assert_eq!(target.class_id, 1);
        }
    }

    #[test]
    fn test_encode_known_offsets() {
        let priors = PriorBoxes::from_rows(&[[0.5, 0.5, 0.5, 0.5]]).unwrap();
        let matched = vec![LabeledBox::new(PointBox::new(0.3, 0.2, 0.8, 0.7), 7)];
        let encoded = encode(&matched, &priors, &Variances::default()).unwrap();

        // center (0.55, 0.45), size (0.5, 0.5)
        assert!((encoded[0].offsets[0] - 1.0).abs() < 1e-9);
        assert!((encoded[0].offsets[1] + 1.0).abs() < 1e-9);
        assert_eq!(encoded[0].class_id, 7);
    }

    #[test]
    fn test_zero_size_box_is_finite() {
        let priors = priors();
        let matched = vec![
            LabeledBox::new(PointBox::new(0.5, 0.5, 0.5, 0.5), 1),
            LabeledBox::background(),
        ];
        let encoded = encode(&matched, &priors, &Variances::default()).unwrap();
        assert!(encoded.iter().flat_map(|e| e.offsets).all(f64::is_finite));
    }

    #[test]
    fn test_roundtrip() {
        let priors = priors();
        let variances = Variances::default();
        let boxes = vec![
            LabeledBox::new(PointBox::new(0.3, 0.35, 0.75, 0.6), 2),
            LabeledBox::new(PointBox::new(0.1, 0.2, 0.3, 0.45), 0),
        ];

        let encoded = encode(&boxes, &priors, &variances).unwrap();
        let decoded = decode(&encoded, &priors, &variances).unwrap();
        for (original, restored) in boxes.iter().zip(&decoded) {
            assert_eq!(original.class_id, restored.class_id);
            for (a, b) in original.coordinates.to_array().iter().zip(restored.coordinates.to_array()) {
                assert!((a - b).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_decode_zero_offsets_gives_prior() {
        let priors = priors();
        let predictions = vec![EncodedBox::new([0.0; 4], 3); 2];
        let decoded = decode(&predictions, &priors, &Variances::default()).unwrap();
        for (labeled, prior) in decoded.iter().zip(priors.point_form()) {
            for (a, b) in labeled.coordinates.to_array().iter().zip(prior.to_array()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let result = encode(&[LabeledBox::background()], &priors(), &Variances::default());
        assert!(matches!(result, Err(DetBoxError::ShapeMismatch(_))));
        let result = decode(&[], &priors(), &Variances::default());
        assert!(matches!(result, Err(DetBoxError::ShapeMismatch(_))));
    }

    #[test]
    fn test_invalid_variances() {
        assert!(Variances::new(0.0, 0.2).is_err());
        assert!(Variances::new(0.1, f64::INFINITY).is_err());
        assert!(serde_json::from_str::<Variances>("[0.1, -0.2]").is_err());
    }

    #[test]
    fn test_one_hot_out_of_range() {
        assert!(to_one_hot(&[3], 3).is_err());
        assert_eq!(to_one_hot(&[], 4).unwrap().dim(), (0, 4));
    }

    #[test]
    fn test_target_encoder_marks_background() {
        let priors = PriorBoxes::from_rows(&[[0.25, 0.25, 0.5, 0.5], [0.75, 0.75, 0.5, 0.5]]).unwrap();
        let encoder = TargetEncoder::new(priors, Variances::default(), 0.5).unwrap();
        let targets = encoder.encode_targets(&[LabeledBox::new(PointBox::new(0.0, 0.0, 0.5, 0.5), 4)]);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].class_id, 4);
        assert_eq!(targets[1].class_id, 0);

        assert!(TargetEncoder::new(encoder.priors().clone(), Variances::default(), 1.5).is_err());
    }
}
