//! Error types for the detbox library.

use thiserror::Error;

/// Result type for detbox operations.
pub type Result<T> = std::result::Result<T, DetBoxError>;

/// Error types that can occur at the boundaries of the library.
///
/// The numerical routines themselves are total: degenerate boxes, empty inputs
/// and undefined metrics resolve to well-defined values instead of errors.
#[derive(Error, Debug)]
pub enum DetBoxError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// IoU threshold outside of [0, 1].
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Non-positive or non-finite codec variances.
    #[error("Invalid variances: {0}")]
    InvalidVariances(String),

    /// Prior box with non-positive or non-finite size.
    #[error("Invalid prior box: {0}")]
    InvalidPrior(String),

    /// Positionally aligned inputs of different lengths.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Malformed ground-truth annotation.
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Detector reported a class name missing from the class map.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Empty dataset or class list provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Failure raised by an external detector.
    #[error("Detector error: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),
}
