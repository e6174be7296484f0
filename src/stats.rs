//! Summary counts of an evaluation run
//!
//! Derived from the per-class accumulators once matching is finished, for
//! logging and for attaching to evaluation results.

use log::info;
use serde::{Deserialize, Serialize};

use crate::accumulator::{ClassAccumulators, MatchOutcome};

/// Totals over every class of an accumulated evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    /// Total number of predictions scored
    pub total_predictions: usize,

    /// Predictions that claimed a ground-truth box
    pub true_positives: usize,

    /// Predictions below the IoU threshold, on the wrong class or duplicated
    pub false_positives: usize,

    /// Predictions matched to difficult ground truth
    pub ignored: usize,

    /// Non-difficult ground-truth boxes
    pub positives: usize,

    /// Classes with at least one non-difficult ground-truth box
    pub classes_with_positives: usize,
}

impl EvaluationStats {
    /// Create a new `EvaluationStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count outcomes and positives over all classes
    pub fn from_accumulators(accumulators: &ClassAccumulators) -> Self {
        let mut stats = Self::new();
        for outcome in accumulators.matches().iter().flatten() {
            stats.total_predictions += 1;
            match outcome {
                MatchOutcome::TruePositive => stats.true_positives += 1,
                MatchOutcome::FalsePositive => stats.false_positives += 1,
                MatchOutcome::Ignored => stats.ignored += 1,
            }
        }
        stats.positives = accumulators.num_positives().iter().sum();
        stats.classes_with_positives = accumulators
            .num_positives()
            .iter()
            .filter(|&&count| count > 0)
            .count();
        stats
    }

    /// Ground-truth positives no prediction claimed
    pub fn missed(&self) -> usize {
        self.positives.saturating_sub(self.true_positives)
    }

    /// Emit the statistics at info level
    pub fn log_summary(&self) {
        info!("=== Evaluation Statistics ===");
        info!("Total predictions: {}", self.total_predictions);
        info!("  - True positives: {}", self.true_positives);
        info!("  - False positives: {}", self.false_positives);
        info!("  - Ignored (difficult): {}", self.ignored);
        info!("Positives: {} ({} missed)", self.positives, self.missed());
        info!("Classes with positives: {}", self.classes_with_positives);
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "EvaluationStats {{ predictions: {}, tp: {}, fp: {}, ignored: {}, positives: {}, classes: {} }}",
            self.total_predictions,
            self.true_positives,
            self.false_positives,
            self.ignored,
            self.positives,
            self.classes_with_positives
        )
    }
}
