//! Average Precision (AP) and mean Average Precision (mAP) calculation.

use log::warn;

use crate::config::ApMethod;
use crate::metrics::precision_recall::RelevanceMetrics;

/// Number of recall levels used by the VOC 2007 metric.
const ELEVEN_POINTS: usize = 11;

/// Calculate AP with the PASCAL VOC 2007 11-point interpolation.
///
/// For each recall level `t` in 0.0, 0.1, ..., 1.0 the interpolated precision
/// is the maximum precision at any point with recall >= `t`, or 0 when no such
/// point exists. NaN precisions count as 0.
///
/// # Example
///
/// ```
/// use detbox::metrics::eleven_point_average_precision;
///
/// let ap = eleven_point_average_precision(&[1.0, 1.0], &[0.5, 1.0]);
/// assert!((ap - 1.0).abs() < 1e-12);
/// ```
pub fn eleven_point_average_precision(precision: &[f64], recall: &[f64]) -> f64 {
    (0..ELEVEN_POINTS)
        .map(|step| {
            let recall_level = step as f64 * 0.1;
            precision
                .iter()
                .zip(recall)
                .filter(|(_, &r)| r >= recall_level)
                .map(|(&p, _)| nan_to_zero(p))
                .fold(0.0f64, f64::max)
        })
        .sum::<f64>()
        / ELEVEN_POINTS as f64
}

/// Calculate AP as the area under the monotone precision envelope (VOC 2010+).
///
/// The curve is padded with (recall 0, precision 0) in front and
/// (recall 1, precision 0) at the end, precision is replaced by its running
/// maximum taken from the high-recall end, and `Δrecall * precision` is summed
/// over every point where recall changes. NaN precisions count as 0.
///
/// # Example
///
/// ```
/// use detbox::metrics::every_point_average_precision;
///
/// let ap = every_point_average_precision(&[1.0, 0.5], &[0.5, 0.5]);
/// assert!((ap - 0.5).abs() < 1e-12);
/// ```
pub fn every_point_average_precision(precision: &[f64], recall: &[f64]) -> f64 {
    let mut envelope: Vec<f64> = std::iter::once(0.0)
        .chain(precision.iter().map(|&p| nan_to_zero(p)))
        .chain(std::iter::once(0.0))
        .collect();
    let recall: Vec<f64> = std::iter::once(0.0)
        .chain(recall.iter().copied())
        .chain(std::iter::once(1.0))
        .collect();

    for i in (0..envelope.len() - 1).rev() {
        envelope[i] = envelope[i].max(envelope[i + 1]);
    }

    recall
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] != pair[0])
        .map(|(i, pair)| (pair[1] - pair[0]) * envelope[i + 1])
        .sum()
}

/// Calculate AP for every class, indexed by class id.
///
/// Classes with undefined recall (no ground-truth positives) and the
/// background slot get NaN.
pub fn calculate_average_precisions(metrics: &RelevanceMetrics, method: ApMethod) -> Vec<f64> {
    metrics
        .precision
        .iter()
        .zip(&metrics.recall)
        .map(|(precision, recall)| match (precision, recall) {
            (Some(precision), Some(recall)) => match method {
                ApMethod::ElevenPoint => eleven_point_average_precision(precision, recall),
                ApMethod::EveryPoint => every_point_average_precision(precision, recall),
            },
            _ => f64::NAN,
        })
        .collect()
}

/// Calculate mean Average Precision over the defined (non-NaN) class APs.
///
/// Returns NaN when no class AP is defined.
///
/// # Example
///
/// ```
/// use detbox::metrics::calculate_map;
///
/// let map = calculate_map(&[f64::NAN, 0.8, 0.9, f64::NAN, 0.75, 0.85]);
/// assert!((map - 0.825).abs() < 1e-10);
/// ```
pub fn calculate_map(average_precisions: &[f64]) -> f64 {
    let defined: Vec<f64> = average_precisions
        .iter()
        .copied()
        .filter(|ap| !ap.is_nan())
        .collect();

    if defined.is_empty() {
        warn!("no class has ground-truth positives, mAP is undefined");
        return f64::NAN;
    }

    defined.iter().sum::<f64>() / defined.len() as f64
}

fn nan_to_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}
