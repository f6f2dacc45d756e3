use thiserror::Error;

/// Errors returned by classifiers and model selection.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty dataset")]
    EmptyDataset,

    #[error("need at least 2 classes, got {0}")]
    TooFewClasses(usize),

    #[error("class {class} has only {count} sample(s), need at least 2")]
    TooFewSamples { class: usize, count: usize },

    #[error("classifier is not fitted")]
    NotFitted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
