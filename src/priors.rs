//! The fixed, ordered anchor ("prior") box set of a detection model.

use std::sync::Arc;

use crate::error::{DetBoxError, Result};
use crate::types::{CenterBox, PointBox};

/// Immutable, cheaply clonable set of center-form prior boxes.
///
/// Matcher and codec outputs are positionally aligned with this sequence, so a
/// single `PriorBoxes` value should be shared by every call site of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorBoxes {
    center_form: Arc<[CenterBox]>,
    point_form: Arc<[PointBox]>,
}

impl PriorBoxes {
    /// Build a prior set from center-form boxes.
    ///
    /// # Errors
    ///
    /// Returns an error if any prior has a non-finite coordinate or a
    /// non-positive width or height; the codec divides by prior sizes.
    pub fn new(boxes: Vec<CenterBox>) -> Result<Self> {
        for (index, prior) in boxes.iter().enumerate() {
            if prior.to_array().iter().any(|value| !value.is_finite()) {
                return Err(DetBoxError::InvalidPrior(format!(
                    "prior {index} has non-finite coordinates"
                )));
            }
            if prior.width <= 0.0 || prior.height <= 0.0 {
                return Err(DetBoxError::InvalidPrior(format!(
                    "prior {index} has non-positive size {}x{}",
                    prior.width, prior.height
                )));
            }
        }

        let point_form: Vec<PointBox> = boxes.iter().map(CenterBox::to_point_form).collect();
        Ok(Self {
            center_form: boxes.into(),
            point_form: point_form.into(),
        })
    }

    /// Build a prior set from `[center_x, center_y, width, height]` rows.
    pub fn from_rows(rows: &[[f64; 4]]) -> Result<Self> {
        Self::new(rows.iter().copied().map(CenterBox::from).collect())
    }

    pub fn len(&self) -> usize {
        self.center_form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.center_form.is_empty()
    }

    /// Priors in center-form.
    pub fn center_form(&self) -> &[CenterBox] {
        &self.center_form
    }

    /// Priors in point-form, same order as [`PriorBoxes::center_form`].
    pub fn point_form(&self) -> &[PointBox] {
        &self.point_form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_form_is_aligned() {
        let priors = PriorBoxes::from_rows(&[[0.5, 0.5, 0.25, 0.5], [0.1, 0.1, 0.2, 0.2]]).unwrap();
        assert_eq!(priors.len(), 2);
        assert_eq!(priors.point_form()[0], PointBox::new(0.375, 0.25, 0.625, 0.75));
        assert_eq!(priors.center_form()[1], CenterBox::new(0.1, 0.1, 0.2, 0.2));
    }

    #[test]
    fn test_rejects_degenerate_prior() {
        assert!(PriorBoxes::from_rows(&[[0.5, 0.5, 0.0, 0.4]]).is_err());
        assert!(PriorBoxes::from_rows(&[[0.5, f64::NAN, 0.1, 0.4]]).is_err());
    }

    #[test]
    fn test_clones_share_storage() {
        let priors = PriorBoxes::from_rows(&[[0.5, 0.5, 0.2, 0.2]]).unwrap();
        let shared = priors.clone();
        assert!(std::ptr::eq(priors.center_form(), shared.center_form()));
    }
}
