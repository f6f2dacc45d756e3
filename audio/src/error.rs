use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by audio loading and processing.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("{path} contains no decodable audio track")]
    NoAudioTrack { path: PathBuf },

    #[error("{path} decoded to zero samples")]
    Empty { path: PathBuf },
}
