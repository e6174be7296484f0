//! Precision and recall curves per class.

use crate::accumulator::{ClassAccumulators, MatchOutcome};
use crate::error::{DetBoxError, Result};

/// Precision and recall curves indexed by class id.
///
/// `precision[c]` is `None` only for the background slot. `recall[c]` is also
/// `None` for every class without ground-truth positives, whose recall is
/// undefined. A precision entry is NaN while only ignored predictions have
/// been seen (0 / 0).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceMetrics {
    pub precision: Vec<Option<Vec<f64>>>,
    pub recall: Vec<Option<Vec<f64>>>,
}

impl RelevanceMetrics {
    /// Compute the curves from accumulated matches.
    pub fn from_accumulators(accumulators: &ClassAccumulators) -> Result<Self> {
        calculate_relevance_metrics(
            accumulators.num_positives(),
            accumulators.scores(),
            accumulators.matches(),
        )
    }

    pub fn num_classes(&self) -> usize {
        self.precision.len().saturating_sub(1)
    }
}

/// Calculate precision and recall for every class.
///
/// All three inputs are indexed by class id with slot 0 for background.
/// Matches are re-sorted by descending score (stable on ties, `f64::total_cmp`
/// order) before the cumulative true/false positive counts are taken; ignored
/// matches count as neither.
///
/// # Errors
///
/// Returns an error if the inputs disagree on the number of classes or if a
/// class has a different number of scores and matches.
///
/// # Example
///
/// ```
/// use detbox::accumulator::MatchOutcome;
/// use detbox::metrics::calculate_relevance_metrics;
///
/// let metrics = calculate_relevance_metrics(
///     &[0, 1],
///     &[vec![], vec![0.5, 0.9]],
///     &[vec![], vec![MatchOutcome::FalsePositive, MatchOutcome::TruePositive]],
/// )
/// .unwrap();
/// assert_eq!(metrics.precision[1], Some(vec![1.0, 0.5]));
/// assert_eq!(metrics.recall[1], Some(vec![1.0, 1.0]));
/// ```
pub fn calculate_relevance_metrics(
    num_positives: &[usize],
    scores: &[Vec<f64>],
    matches: &[Vec<MatchOutcome>],
) -> Result<RelevanceMetrics> {
    if scores.len() != num_positives.len() || matches.len() != num_positives.len() {
        return Err(DetBoxError::ShapeMismatch(format!(
            "{} positive counts, {} score lists and {} match lists",
            num_positives.len(),
            scores.len(),
            matches.len()
        )));
    }

    let num_slots = num_positives.len();
    let mut metrics = RelevanceMetrics {
        precision: vec![None; num_slots],
        recall: vec![None; num_slots],
    };

    for class_id in 1..num_slots {
        let class_scores = &scores[class_id];
        let class_matches = &matches[class_id];
        if class_scores.len() != class_matches.len() {
            return Err(DetBoxError::ShapeMismatch(format!(
                "class {class_id} has {} scores and {} matches",
                class_scores.len(),
                class_matches.len()
            )));
        }

        let mut order: Vec<usize> = (0..class_scores.len()).collect();
        order.sort_by(|&a, &b| class_scores[b].total_cmp(&class_scores[a]));

        let mut true_positives = Vec::with_capacity(order.len());
        let mut precision = Vec::with_capacity(order.len());
        let (mut tp, mut fp) = (0usize, 0usize);
        for index in order {
            match class_matches[index] {
                MatchOutcome::TruePositive => tp += 1,
                MatchOutcome::FalsePositive => fp += 1,
                MatchOutcome::Ignored => {}
            }
            true_positives.push(tp);
            precision.push(tp as f64 / (tp + fp) as f64);
        }

        let positives = num_positives[class_id];
        if positives > 0 {
            metrics.recall[class_id] = Some(
                true_positives
                    .iter()
                    .map(|&count| count as f64 / positives as f64)
                    .collect(),
            );
        }
        metrics.precision[class_id] = Some(precision);
    }

    Ok(metrics)
}
