//! Precision/recall and average precision over accumulated matches.

pub mod ap;
pub mod precision_recall;

pub use ap::{
    calculate_average_precisions, calculate_map, eleven_point_average_precision,
    every_point_average_precision,
};
pub use precision_recall::{calculate_relevance_metrics, RelevanceMetrics};
