//! Prediction errors

use thiserror::Error;

/// Errors raised by training, prediction, and model persistence
#[derive(Error, Debug)]
pub enum PredictError {
    /// Predicting before any successful training run. Callers are expected
    /// to catch this and train (or load a model) first.
    #[error("Model is not trained; call train() or load a model first")]
    NotTrained,
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("Feature matrix has {rows} rows but {targets} target values")]
    DimensionMismatch { rows: usize, targets: usize },
    #[error("Expected {expected} features per row, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
    #[error("Validation split {0} must be inside (0, 1)")]
    InvalidSplit(f64),
    #[error("Too few samples: need at least {needed}, got {got}")]
    TooFewSamples { needed: usize, got: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
