//! Dataset-level mAP evaluation of an object detector.

use std::collections::HashMap;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::accumulator::ClassAccumulators;
use crate::config::{validate_iou_threshold, ApMethod, EvaluationConfig};
use crate::error::{DetBoxError, Result};
use crate::metrics::ap::{calculate_average_precisions, calculate_map};
use crate::metrics::precision_recall::RelevanceMetrics;
use crate::stats::EvaluationStats;
use crate::types::{Detection, Sample, ScoredBox};

/// Error type external detectors report through.
pub type DetectorError = Box<dyn std::error::Error + Send + Sync>;

/// An object detector producing detections for one input at a time.
pub trait Detector {
    /// What the detector consumes, typically an image.
    type Image;

    /// Run inference on one input.
    fn detect(&self, image: &Self::Image) -> std::result::Result<Vec<Detection>, DetectorError>;
}

/// Mapping between class names and class ids `1..=num_classes`.
///
/// Id 0 is reserved for background and never assigned to a name.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl ClassMap {
    /// Build a class map; the first name gets id 1.
    ///
    /// # Errors
    ///
    /// Returns an error if `names` is empty or contains duplicates.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(DetBoxError::EmptyDataset(
                "class map must contain at least one class".to_string(),
            ));
        }

        let mut indices = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if indices.insert(name.clone(), position + 1).is_some() {
                return Err(DetBoxError::InvalidAnnotation(format!(
                    "duplicate class name '{name}'"
                )));
            }
        }

        Ok(Self { names, indices })
    }

    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Class id of `name`.
    pub fn class_to_index(&self, name: &str) -> Result<usize> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| DetBoxError::UnknownClass(name.to_string()))
    }

    /// Name of class `class_id`, `None` for background or unknown ids.
    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        class_id
            .checked_sub(1)
            .and_then(|position| self.names.get(position))
            .map(String::as_str)
    }

    /// Resolve the class names of detector output into class ids.
    pub fn resolve(&self, detections: &[Detection]) -> Result<Vec<ScoredBox>> {
        detections
            .iter()
            .map(|detection| {
                Ok(ScoredBox::new(
                    detection.coordinates,
                    self.class_to_index(&detection.class_name)?,
                    detection.score,
                ))
            })
            .collect()
    }
}

/// Average precision per class and their mean.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// AP indexed by class id; NaN for background and classes without positives
    pub average_precisions: Vec<f64>,
    /// Mean over the defined entries of `average_precisions`
    pub mean_average_precision: f64,
    pub stats: EvaluationStats,
}

impl EvaluationResult {
    /// `(class_id, ap)` pairs for every non-background class.
    pub fn ap_per_class(&self) -> Vec<(usize, f64)> {
        self.average_precisions
            .iter()
            .copied()
            .enumerate()
            .skip(1)
            .collect()
    }
}

fn accumulate_sample<D: Detector>(
    accumulators: &mut ClassAccumulators,
    sample: &Sample<D::Image>,
    detector: &D,
    class_map: &ClassMap,
    iou_threshold: f64,
) -> Result<()> {
    let detections = detector.detect(&sample.image).map_err(DetBoxError::Detector)?;
    let predictions = class_map.resolve(&detections)?;
    let difficulties = sample.resolved_difficulties()?;
    accumulators.add_sample(&predictions, &sample.boxes, &difficulties, iou_threshold)
}

/// Run `detector` over `dataset` and accumulate per-class matches.
///
/// # Errors
///
/// Returns an error if `iou_threshold` is outside [0, 1], if the detector
/// fails, reports a class missing from `class_map`, or if a sample carries
/// malformed ground truth.
pub fn compute_matches<'a, D>(
    dataset: impl IntoIterator<Item = &'a Sample<D::Image>>,
    detector: &D,
    class_map: &ClassMap,
    iou_threshold: f64,
) -> Result<ClassAccumulators>
where
    D: Detector,
    D::Image: 'a,
{
    validate_iou_threshold(iou_threshold)?;

    let mut accumulators = ClassAccumulators::new(class_map.num_classes());
    for (index, sample) in dataset.into_iter().enumerate() {
        accumulate_sample(&mut accumulators, sample, detector, class_map, iou_threshold)?;
        debug!("accumulated sample {index}");
    }
    Ok(accumulators)
}

/// Parallel [`compute_matches`] over the rayon thread pool.
///
/// Every worker fills its own accumulators, which are merged at the end.
/// Scores and outcomes may be collected in any order; the relevance metrics
/// re-sort them, so the final evaluation equals the sequential one.
pub fn compute_matches_parallel<D>(
    dataset: &[Sample<D::Image>],
    detector: &D,
    class_map: &ClassMap,
    iou_threshold: f64,
) -> Result<ClassAccumulators>
where
    D: Detector + Sync,
    D::Image: Sync,
{
    validate_iou_threshold(iou_threshold)?;

    let num_classes = class_map.num_classes();
    dataset
        .par_iter()
        .try_fold(
            || ClassAccumulators::new(num_classes),
            |mut accumulators, sample| {
                accumulate_sample(&mut accumulators, sample, detector, class_map, iou_threshold)?;
                Ok::<_, DetBoxError>(accumulators)
            },
        )
        .try_reduce(
            || ClassAccumulators::new(num_classes),
            |left, right| Ok(left.merge(right)),
        )
}

/// Reduce accumulated matches into per-class AP and mAP.
pub fn evaluate_accumulators(accumulators: &ClassAccumulators, method: ApMethod) -> Result<EvaluationResult> {
    let relevance = RelevanceMetrics::from_accumulators(accumulators)?;
    let average_precisions = calculate_average_precisions(&relevance, method);
    let mean_average_precision = calculate_map(&average_precisions);
    let stats = EvaluationStats::from_accumulators(accumulators);

    info!(
        "mAP {:.4} over {} of {} classes ({:?})",
        mean_average_precision,
        stats.classes_with_positives,
        accumulators.num_classes(),
        method
    );
    stats.log_summary();

    Ok(EvaluationResult {
        average_precisions,
        mean_average_precision,
        stats,
    })
}

/// Evaluate a detector over a dataset with PASCAL VOC style mAP.
///
/// # Example
///
/// ```
/// use detbox::evaluator::{evaluate_map, ClassMap, Detector, DetectorError};
/// use detbox::config::EvaluationConfig;
/// use detbox::types::{Detection, LabeledBox, PointBox, Sample};
///
/// struct Oracle;
///
/// impl Detector for Oracle {
///     type Image = Vec<Detection>;
///
///     fn detect(&self, image: &Self::Image) -> Result<Vec<Detection>, DetectorError> {
///         Ok(image.clone())
///     }
/// }
///
/// let class_map = ClassMap::new(["cat"]).unwrap();
/// let boxes = vec![LabeledBox::new(PointBox::new(0.0, 0.0, 10.0, 10.0), 1)];
/// let detections = vec![Detection::new(PointBox::new(0.0, 0.0, 10.0, 10.0), "cat", 0.9)];
/// let dataset = vec![Sample::new(detections, boxes)];
///
/// let result = evaluate_map(&dataset, &Oracle, &class_map, &EvaluationConfig::default()).unwrap();
/// assert!((result.mean_average_precision - 1.0).abs() < 1e-12);
/// ```
pub fn evaluate_map<'a, D>(
    dataset: impl IntoIterator<Item = &'a Sample<D::Image>>,
    detector: &D,
    class_map: &ClassMap,
    config: &EvaluationConfig,
) -> Result<EvaluationResult>
where
    D: Detector,
    D::Image: 'a,
{
    config.validate()?;
    let accumulators = compute_matches(dataset, detector, class_map, config.iou_threshold)?;
    evaluate_accumulators(&accumulators, config.method)
}

/// [`evaluate_map`] with samples processed in parallel.
pub fn evaluate_map_parallel<D>(
    dataset: &[Sample<D::Image>],
    detector: &D,
    class_map: &ClassMap,
    config: &EvaluationConfig,
) -> Result<EvaluationResult>
where
    D: Detector + Sync,
    D::Image: Sync,
{
    config.validate()?;
    let accumulators = compute_matches_parallel(dataset, detector, class_map, config.iou_threshold)?;
    evaluate_accumulators(&accumulators, config.method)
}
