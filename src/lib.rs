//! # detbox
//!
//! Deterministic box geometry for single-shot object detectors: the pieces
//! that sit between a dataset and a model.
//!
//! - **Geometry**: point-form/center-form conversion, IoU, IoU matrices
//! - **Anchor matching**: assign every prior box a ground-truth box or background
//! - **Box codec**: encode matched boxes as regression targets relative to the
//!   priors and decode predictions back
//! - **Evaluation**: PASCAL VOC style precision/recall, AP (11-point and
//!   every-point) and mAP over a dataset
//!
//! ## Quick Start
//!
//! ```rust
//! use detbox::codec::{TargetEncoder, Variances};
//! use detbox::priors::PriorBoxes;
//! use detbox::types::{LabeledBox, PointBox};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let priors = PriorBoxes::from_rows(&[[0.25, 0.25, 0.5, 0.5], [0.75, 0.75, 0.5, 0.5]])?;
//! let encoder = TargetEncoder::new(priors, Variances::default(), 0.5)?;
//!
//! let ground_truth = [LabeledBox::new(PointBox::new(0.0, 0.0, 0.5, 0.5), 1)];
//! let targets = encoder.encode_targets(&ground_truth);
//! assert_eq!(targets[0].class_id, 1);
//! assert_eq!(targets[1].class_id, 0);
//!
//! let decoded = encoder.decode_predictions(&targets)?;
//! assert!((decoded[0].coordinates.x_max - 0.5).abs() < 1e-3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Recorded evaluation sets
//!
//! Detections produced offline can be evaluated from JSON:
//!
//! ```json
//! {
//!   "classes": ["cat", "dog"],
//!   "samples": [
//!     {
//!       "image_id": 1,
//!       "boxes": [[x_min, y_min, x_max, y_max, class_id]],
//!       "difficulties": [false],
//!       "detections": [
//!         {"coordinates": [x_min, y_min, x_max, y_max], "class_name": "cat", "score": 0.9}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Class ids start at 1; 0 is background.

pub mod accumulator;
pub mod codec;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod loader;
pub mod matcher;
pub mod metrics;
pub mod priors;
pub mod stats;
pub mod types;

// Re-export commonly used types and functions
pub use codec::{decode, encode, to_one_hot, TargetEncoder, Variances};
pub use config::{ApMethod, EvaluationConfig, PriorConfig};
pub use error::{DetBoxError, Result};
pub use evaluator::{evaluate_map, evaluate_map_parallel, ClassMap, Detector, EvaluationResult};
pub use geometry::{
    apply_offsets, compute_iou, compute_ious, iou, make_box_square, reversed_argmax, to_center_form,
    to_point_form,
};
pub use loader::{load_from_file, load_from_string, RecordedDetector};
pub use matcher::match_priors;
pub use priors::PriorBoxes;
pub use types::{CenterBox, Detection, EncodedBox, LabeledBox, PointBox, Sample, ScoredBox};
