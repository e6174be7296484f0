//! Assignment of ground-truth boxes to prior boxes.

use log::debug;
use ndarray::Axis;

use crate::geometry::{compute_ious, reversed_argmax};
use crate::priors::PriorBoxes;
use crate::types::{LabeledBox, PointBox, BACKGROUND_CLASS};

/// IoU above which a prior is considered a positive match.
pub const DEFAULT_MATCH_IOU_THRESHOLD: f64 = 0.5;

/// Match every prior box with a ground-truth box.
///
/// Returns one record per prior, positionally aligned with `priors`. Each
/// record carries the coordinates of the ground-truth box with the highest IoU
/// for that prior (ties resolve to the last ground-truth box). The class label
/// is kept when the IoU reaches `iou_threshold` and set to background otherwise.
///
/// Every ground-truth box is additionally forced onto its own best prior (ties
/// resolve to the last prior), regardless of the threshold. When several
/// ground-truth boxes share the same best prior, the one appearing last in
/// `boxes` keeps it.
///
/// An empty `boxes` slice yields all-background matches.
///
/// # Example
///
/// ```
/// use detbox::matcher::match_priors;
/// use detbox::priors::PriorBoxes;
/// use detbox::types::{LabeledBox, PointBox};
///
/// let priors = PriorBoxes::from_rows(&[[0.25, 0.25, 0.5, 0.5], [0.75, 0.75, 0.5, 0.5]]).unwrap();
/// let boxes = vec![LabeledBox::new(PointBox::new(0.0, 0.0, 0.5, 0.5), 3)];
/// let matches = match_priors(&boxes, &priors, 0.5);
/// assert_eq!(matches[0].class_id, 3);
/// assert!(matches[1].is_background());
/// ```
pub fn match_priors(boxes: &[LabeledBox], priors: &PriorBoxes, iou_threshold: f64) -> Vec<LabeledBox> {
    if boxes.is_empty() || priors.is_empty() {
        return vec![LabeledBox::background(); priors.len()];
    }

    let coordinates: Vec<PointBox> = boxes.iter().map(|labeled| labeled.coordinates).collect();
    let ious = compute_ious(&coordinates, priors.point_form());

    let best_box_per_prior = reversed_argmax(ious.view(), Axis(0));
    let best_prior_per_box = reversed_argmax(ious.view(), Axis(1));

    // ground-truth index -> prior index, later boxes overwrite earlier ones
    let mut forced_box_per_prior: Vec<Option<usize>> = vec![None; priors.len()];
    for (box_index, &prior_index) in best_prior_per_box.iter().enumerate() {
        forced_box_per_prior[prior_index] = Some(box_index);
    }

    let matches: Vec<LabeledBox> = forced_box_per_prior
        .iter()
        .enumerate()
        .map(|(prior_index, forced)| match *forced {
            Some(box_index) => boxes[box_index],
            None => {
                let box_index = best_box_per_prior[prior_index];
                let mut matched = boxes[box_index];
                if ious[[box_index, prior_index]] < iou_threshold {
                    matched.class_id = BACKGROUND_CLASS;
                }
                matched
            }
        })
        .collect();

    debug!(
        "matched {} ground-truth boxes to {} priors, {} positive",
        boxes.len(),
        priors.len(),
        matches.iter().filter(|matched| !matched.is_background()).count()
    );

    matches
}
