//! JSON loading of configurations and recorded evaluation sets.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{EvaluationConfig, PriorConfig};
use crate::error::{DetBoxError, Result};
use crate::evaluator::{ClassMap, Detector, DetectorError};
use crate::types::{Detection, LabeledBox, Sample};

/// One recorded image: its ground truth and what a detector reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    pub image_id: u64,
    /// `[x_min, y_min, x_max, y_max, class]` rows
    pub boxes: Vec<LabeledBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<Vec<bool>>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A dataset whose detections were produced offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvaluationSet {
    /// Class names in id order, without background
    pub classes: Vec<String>,
    pub samples: Vec<RecordedSample>,
}

impl RecordedEvaluationSet {
    /// Split into a class map and samples ready for [`RecordedDetector`].
    ///
    /// # Errors
    ///
    /// Returns an error if the class list is empty or has duplicates.
    pub fn into_dataset(self) -> Result<(ClassMap, Vec<Sample<Vec<Detection>>>)> {
        let class_map = ClassMap::new(self.classes)?;
        let samples = self
            .samples
            .into_iter()
            .map(|recorded| {
                let sample = Sample::new(recorded.detections, recorded.boxes);
                match recorded.difficulties {
                    Some(flags) => sample.with_difficulties(flags),
                    None => sample,
                }
            })
            .collect();
        Ok((class_map, samples))
    }
}

/// Detector replaying the detections stored alongside each sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedDetector;

impl Detector for RecordedDetector {
    type Image = Vec<Detection>;

    fn detect(&self, image: &Self::Image) -> std::result::Result<Vec<Detection>, DetectorError> {
        Ok(image.clone())
    }
}

/// Load a recorded evaluation set from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
///
/// ```no_run
/// use detbox::loader::load_from_file;
///
/// let recorded = load_from_file("recorded.json").unwrap();
/// println!("Loaded {} samples", recorded.samples.len());
/// ```
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RecordedEvaluationSet> {
    let recorded: RecordedEvaluationSet = read_json(path)?;
    validate_evaluation_set(&recorded)?;
    Ok(recorded)
}

/// Load a recorded evaluation set from a JSON string.
///
/// # Example
///
/// ```
/// use detbox::loader::load_from_string;
///
/// let json = r#"{
///     "classes": ["cat", "dog"],
///     "samples": [
///         {
///             "image_id": 1,
///             "boxes": [[0.0, 0.0, 10.0, 10.0, 2]],
///             "detections": [
///                 {"coordinates": [0.0, 0.0, 10.0, 10.0], "class_name": "dog", "score": 0.8}
///             ]
///         }
///     ]
/// }"#;
/// let recorded = load_from_string(json).unwrap();
/// assert_eq!(recorded.samples[0].boxes[0].class_id, 2);
/// ```
pub fn load_from_string(json_str: &str) -> Result<RecordedEvaluationSet> {
    let recorded: RecordedEvaluationSet = serde_json::from_str(json_str)?;
    validate_evaluation_set(&recorded)?;
    Ok(recorded)
}

/// Load and validate an [`EvaluationConfig`] from a JSON file.
pub fn load_evaluation_config<P: AsRef<Path>>(path: P) -> Result<EvaluationConfig> {
    let config: EvaluationConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

/// Load a [`PriorConfig`] from a JSON file.
///
/// The priors are validated when the config is turned into an encoder.
pub fn load_prior_config<P: AsRef<Path>>(path: P) -> Result<PriorConfig> {
    read_json(path)
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    debug!("reading {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Check class lists, label ranges and difficulty alignment.
fn validate_evaluation_set(recorded: &RecordedEvaluationSet) -> Result<()> {
    if recorded.classes.is_empty() {
        return Err(DetBoxError::EmptyDataset(
            "evaluation set must contain at least one class".to_string(),
        ));
    }

    let num_classes = recorded.classes.len();
    for sample in &recorded.samples {
        if let Some(flags) = &sample.difficulties {
            if flags.len() != sample.boxes.len() {
                return Err(DetBoxError::ShapeMismatch(format!(
                    "image {} has {} difficulty flags for {} boxes",
                    sample.image_id,
                    flags.len(),
                    sample.boxes.len()
                )));
            }
        }

        for labeled in &sample.boxes {
            if labeled.class_id == 0 || labeled.class_id > num_classes {
                return Err(DetBoxError::InvalidAnnotation(format!(
                    "image {} has class {} outside [1, {num_classes}]",
                    sample.image_id, labeled.class_id
                )));
            }
        }
    }

    Ok(())
}
