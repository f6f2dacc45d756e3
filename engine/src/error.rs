use thiserror::Error;

/// Errors surfaced by training and dataset assembly.
///
/// Per-file decode and extraction failures are handled where they occur
/// (logged, file skipped); only run-level failures reach this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error(transparent)]
    Ml(#[from] voxid_ml::MlError),

    #[error(transparent)]
    Store(#[from] voxid_store::StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
