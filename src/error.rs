//! Error types for the seg-eval library.

use thiserror::Error;

/// Result type for seg-eval operations.
pub type Result<T> = std::result::Result<T, SegEvalError>;

/// Error types that can occur while evaluating segmentation predictions.
///
/// Structural errors (`ShapeMismatch`, `LengthMismatch`,
/// `BatchLengthMismatch`) abort the batch they occur in. Numeric edge cases
/// such as absent classes or fully ignored batches are never errors.
#[derive(Error, Debug)]
pub enum SegEvalError {
    /// A mask or label map does not have the expected `(height, width)`.
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Mask and class-id lists of one sample differ in length.
    #[error("Length mismatch: {masks} masks but {class_ids} class ids")]
    LengthMismatch { masks: usize, class_ids: usize },

    /// A batch pairs a different number of predictions and targets.
    #[error("Batch length mismatch: {predictions} predictions but {targets} targets")]
    BatchLengthMismatch { predictions: usize, targets: usize },

    /// Invalid evaluation configuration, reported before any batch is processed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Empty input provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SegEvalError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }
}
