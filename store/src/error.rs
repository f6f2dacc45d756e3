use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the model store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },

    #[error("failed to deserialize {path}: {reason}")]
    Deserialize { path: PathBuf, reason: String },
}
