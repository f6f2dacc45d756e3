use thiserror::Error;

/// Errors returned by feature extraction.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    TooShort {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("unsupported feature type: {0:?} (expected \"mfcc\" or \"mel\")")]
    UnsupportedType(String),
}
