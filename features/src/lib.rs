//! Acoustic feature extraction.
//!
//! Turns a normalized [`voxid_audio::Waveform`] into the frame-major feature
//! matrices the classifiers consume:
//!
//! - [`extract_mfcc`]: Hann-windowed FFT power spectrum -> mel triangular
//!   filterbank -> log -> DCT-II -> first `n_mfcc` cepstral coefficients
//! - [`extract_mel`]: log-power mel spectrogram (diagnostics only; training
//!   is MFCC-only by design)
//!
//! Because every clip is normalized to a fixed duration before extraction,
//! all clips yield the same frame count and therefore the same flattened
//! vector length — the invariant the dataset builder relies on.

mod error;
mod extract;
mod fft;
mod mel;

pub use error::FeatureError;
pub use extract::{
    DEFAULT_HOP, DEFAULT_N_MELS, DEFAULT_N_MFCC, DEFAULT_WINDOW, FeatureConfig, FeatureType,
    extract, extract_mel, extract_mfcc, flatten,
};
