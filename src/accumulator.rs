//! Per-class match statistics accumulated over a dataset.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DetBoxError, Result};
use crate::geometry::compute_ious;
use crate::types::{LabeledBox, PointBox, ScoredBox};

/// Added to the max corner of every box before evaluation IoUs are computed,
/// treating coordinates as inclusive integer pixel bounds.
pub const PIXEL_INCLUSIVE_OFFSET: f64 = 1.0;

/// Outcome of matching one prediction against the ground truth of its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Matched a difficult ground-truth box; neither true nor false positive
    Ignored,
    FalsePositive,
    TruePositive,
}

impl MatchOutcome {
    /// Numeric encoding: -1 ignored, 0 false positive, 1 true positive.
    pub fn value(self) -> i8 {
        match self {
            Self::Ignored => -1,
            Self::FalsePositive => 0,
            Self::TruePositive => 1,
        }
    }
}

/// Positive counts, scores and match outcomes for every class.
///
/// Storage is indexed by class id; slot 0 (background) is never written.
/// Scores and outcomes of a class are parallel lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassAccumulators {
    num_positives: Vec<usize>,
    scores: Vec<Vec<f64>>,
    matches: Vec<Vec<MatchOutcome>>,
}

impl ClassAccumulators {
    /// Empty accumulators for class ids `1..=num_classes`.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_positives: vec![0; num_classes + 1],
            scores: vec![Vec::new(); num_classes + 1],
            matches: vec![Vec::new(); num_classes + 1],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_positives.len().saturating_sub(1)
    }

    /// Non-difficult ground-truth boxes seen so far, indexed by class id.
    pub fn num_positives(&self) -> &[usize] {
        &self.num_positives
    }

    /// Prediction scores, indexed by class id.
    pub fn scores(&self) -> &[Vec<f64>] {
        &self.scores
    }

    /// Match outcomes, indexed by class id and parallel to [`ClassAccumulators::scores`].
    pub fn matches(&self) -> &[Vec<MatchOutcome>] {
        &self.matches
    }

    /// Score one image's predictions against its ground truth.
    ///
    /// For every class present in either the predictions or the ground truth,
    /// predictions are visited by descending score (stable on ties, ordered by
    /// `f64::total_cmp`, so a positive NaN score ranks first). Each one is
    /// matched to its highest-IoU ground-truth box of the same class: below
    /// `iou_threshold` it is a false positive, on a difficult box it is
    /// ignored, on a box already claimed by a higher-scoring prediction it is a
    /// false positive, otherwise a true positive that claims the box.
    ///
    /// # Errors
    ///
    /// Returns an error if `difficulties` is not aligned with `ground_truth` or
    /// if a class id is outside `1..=num_classes`.
    pub fn add_sample(
        &mut self,
        predictions: &[ScoredBox],
        ground_truth: &[LabeledBox],
        difficulties: &[bool],
        iou_threshold: f64,
    ) -> Result<()> {
        if difficulties.len() != ground_truth.len() {
            return Err(DetBoxError::ShapeMismatch(format!(
                "{} difficulty flags for {} ground-truth boxes",
                difficulties.len(),
                ground_truth.len()
            )));
        }

        let class_ids: BTreeSet<usize> = predictions
            .iter()
            .map(|prediction| prediction.class_id)
            .chain(ground_truth.iter().map(|labeled| labeled.class_id))
            .collect();
        for &class_id in &class_ids {
            self.check_class(class_id)?;
        }

        for class_id in class_ids {
            let mut class_predictions: Vec<&ScoredBox> = predictions
                .iter()
                .filter(|prediction| prediction.class_id == class_id)
                .collect();
            class_predictions.sort_by(|a, b| b.score.total_cmp(&a.score));

            let (class_boxes, class_difficulties): (Vec<PointBox>, Vec<bool>) = ground_truth
                .iter()
                .zip(difficulties)
                .filter(|(labeled, _)| labeled.class_id == class_id)
                .map(|(labeled, &difficult)| (labeled.coordinates, difficult))
                .unzip();

            self.num_positives[class_id] += class_difficulties.iter().filter(|&&difficult| !difficult).count();
            self.scores[class_id].extend(class_predictions.iter().map(|prediction| prediction.score));

            let outcomes = score_class(&class_predictions, &class_boxes, &class_difficulties, iou_threshold);
            debug!(
                "class {class_id}: {} predictions, {} ground-truth boxes, {} true positives",
                class_predictions.len(),
                class_boxes.len(),
                outcomes.iter().filter(|&&outcome| outcome == MatchOutcome::TruePositive).count()
            );
            self.matches[class_id].extend(outcomes);
        }

        Ok(())
    }

    /// Combine two accumulators: positives are summed, lists concatenated.
    pub fn merge(mut self, other: Self) -> Self {
        let num_classes = self.num_classes().max(other.num_classes());
        self.num_positives.resize(num_classes + 1, 0);
        self.scores.resize(num_classes + 1, Vec::new());
        self.matches.resize(num_classes + 1, Vec::new());

        for (class_id, positives) in other.num_positives.into_iter().enumerate() {
            self.num_positives[class_id] += positives;
        }
        for (class_id, scores) in other.scores.into_iter().enumerate() {
            self.scores[class_id].extend(scores);
        }
        for (class_id, matches) in other.matches.into_iter().enumerate() {
            self.matches[class_id].extend(matches);
        }
        self
    }

    fn check_class(&self, class_id: usize) -> Result<()> {
        if class_id == 0 || class_id > self.num_classes() {
            return Err(DetBoxError::InvalidAnnotation(format!(
                "class id {class_id} outside of 1..={}",
                self.num_classes()
            )));
        }
        Ok(())
    }
}

/// Match outcomes for one class of one image, in the given prediction order.
fn score_class(
    predictions: &[&ScoredBox],
    boxes: &[PointBox],
    difficulties: &[bool],
    iou_threshold: f64,
) -> Vec<MatchOutcome> {
    if boxes.is_empty() {
        return vec![MatchOutcome::FalsePositive; predictions.len()];
    }

    let predicted: Vec<PointBox> = predictions
        .iter()
        .map(|prediction| prediction.coordinates.widened(PIXEL_INCLUSIVE_OFFSET))
        .collect();
    let ground_truth: Vec<PointBox> = boxes
        .iter()
        .map(|point_box| point_box.widened(PIXEL_INCLUSIVE_OFFSET))
        .collect();
    let ious = compute_ious(&predicted, &ground_truth);

    let mut claimed = vec![false; boxes.len()];
    ious.rows()
        .into_iter()
        .map(|row| {
            // plain argmax: first maximum wins
            let (best_index, best_iou) = row
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (index, &value)| {
                    if value > best.1 {
                        (index, value)
                    } else {
                        best
                    }
                });

            if best_iou < iou_threshold {
                MatchOutcome::FalsePositive
            } else if difficulties[best_index] {
                MatchOutcome::Ignored
            } else if claimed[best_index] {
                MatchOutcome::FalsePositive
            } else {
                claimed[best_index] = true;
                MatchOutcome::TruePositive
            }
        })
        .collect()
}
