//! Evaluation and prior-box configuration.

use serde::{Deserialize, Serialize};

use crate::codec::{TargetEncoder, Variances};
use crate::error::{DetBoxError, Result};
use crate::matcher::DEFAULT_MATCH_IOU_THRESHOLD;
use crate::priors::PriorBoxes;

/// Default IoU threshold for counting a detection as correct.
pub const DEFAULT_EVALUATION_IOU_THRESHOLD: f64 = 0.5;

/// Validate that an IoU threshold is in the range [0.0, 1.0].
///
/// # Errors
///
/// Returns an error if the threshold is outside [0.0, 1.0] or NaN.
pub fn validate_iou_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DetBoxError::InvalidThreshold(format!(
            "IoU threshold must be between 0.0 and 1.0, got {threshold}"
        )));
    }
    Ok(())
}

/// How a precision-recall curve is integrated into average precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApMethod {
    /// PASCAL VOC 2007: mean interpolated precision at recall 0.0, 0.1, ..., 1.0
    ElevenPoint,
    /// PASCAL VOC 2010+: area under the monotone precision envelope
    #[default]
    EveryPoint,
}

impl ApMethod {
    /// Pick the integration method from the VOC 2007 metric flag.
    pub fn from_use_07_metric(use_07_metric: bool) -> Self {
        if use_07_metric {
            Self::ElevenPoint
        } else {
            Self::EveryPoint
        }
    }
}

/// Settings for a mAP evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum IoU for a prediction to match a ground-truth box
    pub iou_threshold: f64,
    /// Average precision integration method
    pub method: ApMethod,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_EVALUATION_IOU_THRESHOLD,
            method: ApMethod::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        validate_iou_threshold(self.iou_threshold)
    }
}

/// Prior layout of a detection model, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    /// `[center_x, center_y, width, height]` per prior, in model order
    pub priors: Vec<[f64; 4]>,
    #[serde(default)]
    pub variances: Variances,
    /// IoU threshold used when matching ground truth to priors
    #[serde(default = "default_match_iou_threshold")]
    pub iou_threshold: f64,
}

fn default_match_iou_threshold() -> f64 {
    DEFAULT_MATCH_IOU_THRESHOLD
}

impl PriorConfig {
    /// Validate the configuration and build the target encoder it describes.
    pub fn build_encoder(&self) -> Result<TargetEncoder> {
        let priors = PriorBoxes::from_rows(&self.priors)?;
        TargetEncoder::new(priors, self.variances, self.iou_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_iou_threshold() {
        assert!(validate_iou_threshold(0.0).is_ok());
        assert!(validate_iou_threshold(1.0).is_ok());
        assert!(validate_iou_threshold(-0.1).is_err());
        assert!(validate_iou_threshold(1.1).is_err());
        assert!(validate_iou_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_evaluation_defaults_from_empty_json() {
        let config: EvaluationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EvaluationConfig::default());
        assert_eq!(config.method, ApMethod::EveryPoint);
    }

    #[test]
    fn test_method_names() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{"method": "eleven_point", "iou_threshold": 0.7}"#).unwrap();
        assert_eq!(config.method, ApMethod::ElevenPoint);
        assert_eq!(ApMethod::from_use_07_metric(true), ApMethod::ElevenPoint);
        assert_eq!(ApMethod::from_use_07_metric(false), ApMethod::EveryPoint);
    }

    #[test]
    fn test_prior_config_builds_encoder() {
        let config: PriorConfig =
            serde_json::from_str(r#"{"priors": [[0.5, 0.5, 0.2, 0.2]]}"#).unwrap();
        let encoder = config.build_encoder().unwrap();
        assert_eq!(encoder.priors().len(), 1);
        assert_eq!(*encoder.variances(), Variances::default());
        assert_eq!(encoder.iou_threshold(), 0.5);
    }

    #[test]
    fn test_prior_config_rejects_bad_prior() {
        let config = PriorConfig {
            priors: vec![[0.5, 0.5, -0.2, 0.2]],
            variances: Variances::default(),
            iou_threshold: 0.5,
        };
        assert!(matches!(config.build_encoder(), Err(DetBoxError::InvalidPrior(_))));
    }
}
