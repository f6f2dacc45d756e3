use std::fmt;
use std::str::FromStr;

use voxid_audio::Waveform;

use crate::error::FeatureError;
use crate::fft::{fft, hann_window};
use crate::mel::{dct_basis, mel_filterbank};

/// Cepstral coefficients per frame.
pub const DEFAULT_N_MFCC: usize = 13;
/// Mel filterbank channels.
pub const DEFAULT_N_MELS: usize = 40;
/// FFT window length in samples.
pub const DEFAULT_WINDOW: usize = 2048;
/// Frame hop in samples.
pub const DEFAULT_HOP: usize = 512;

/// Floor applied before taking logs of mel energies.
const ENERGY_FLOOR: f64 = 1e-10;

/// Which feature representation to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Mfcc,
    Mel,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mfcc => "mfcc",
            Self::Mel => "mel",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mfcc" => Ok(Self::Mfcc),
            "mel" => Ok(Self::Mel),
            other => Err(FeatureError::UnsupportedType(other.to_string())),
        }
    }
}

/// Configures feature extraction.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Number of cepstral coefficients (default: 13).
    pub n_mfcc: usize,
    /// Number of mel filterbank channels (default: 40).
    pub n_mels: usize,
    /// FFT window length in samples (default: 2048).
    pub window: usize,
    /// Frame hop in samples (default: 512).
    pub hop: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_mfcc: DEFAULT_N_MFCC,
            n_mels: DEFAULT_N_MELS,
            window: DEFAULT_WINDOW,
            hop: DEFAULT_HOP,
        }
    }
}

/// Extracts MFCC features, `[frames][n_mfcc]`.
pub fn extract_mfcc(
    wav: &Waveform,
    cfg: &FeatureConfig,
) -> Result<Vec<Vec<f32>>, FeatureError> {
    let mel_energies = mel_energy_frames(wav, cfg)?;
    let basis = dct_basis(cfg.n_mfcc, cfg.n_mels);

    let mut out = Vec::with_capacity(mel_energies.len());
    for energies in &mel_energies {
        let log_mel: Vec<f64> = energies.iter().map(|&e| e.max(ENERGY_FLOOR).ln()).collect();
        let mut frame = Vec::with_capacity(cfg.n_mfcc);
        for row in &basis {
            let c: f64 = row.iter().zip(&log_mel).map(|(b, l)| b * l).sum();
            frame.push(c as f32);
        }
        out.push(frame);
    }
    Ok(out)
}

/// Extracts a log-power mel spectrogram, `[frames][n_mels]`, scaled so the
/// loudest bin sits at 0 dB.
pub fn extract_mel(wav: &Waveform, cfg: &FeatureConfig) -> Result<Vec<Vec<f32>>, FeatureError> {
    let mel_energies = mel_energy_frames(wav, cfg)?;

    let mut db: Vec<Vec<f64>> = mel_energies
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&e| 10.0 * e.max(ENERGY_FLOOR).log10())
                .collect()
        })
        .collect();

    let peak = db
        .iter()
        .flatten()
        .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    for frame in &mut db {
        for v in frame.iter_mut() {
            *v -= peak;
        }
    }

    Ok(db
        .into_iter()
        .map(|frame| frame.into_iter().map(|v| v as f32).collect())
        .collect())
}

/// Dispatches on feature type.
pub fn extract(
    wav: &Waveform,
    feature_type: FeatureType,
    cfg: &FeatureConfig,
) -> Result<Vec<Vec<f32>>, FeatureError> {
    match feature_type {
        FeatureType::Mfcc => extract_mfcc(wav, cfg),
        FeatureType::Mel => extract_mel(wav, cfg),
    }
}

/// Flattens a frame-major feature matrix to the row-major vector the
/// classifiers consume.
pub fn flatten(features: &[Vec<f32>]) -> Vec<f32> {
    features.iter().flatten().copied().collect()
}

/// Mel filterbank energies per frame, `[frames][n_mels]`, f64 throughout.
fn mel_energy_frames(wav: &Waveform, cfg: &FeatureConfig) -> Result<Vec<Vec<f64>>, FeatureError> {
    let samples = wav.samples();
    if samples.len() < cfg.window {
        return Err(FeatureError::TooShort {
            min_samples: cfg.window,
            got_samples: samples.len(),
        });
    }

    let n_frames = (samples.len() - cfg.window) / cfg.hop + 1;
    let n_bins = cfg.window / 2 + 1;
    let window = hann_window(cfg.window);
    let bank = mel_filterbank(cfg.n_mels, cfg.window, wav.sample_rate() as usize);

    let mut out = Vec::with_capacity(n_frames);
    let mut buf = vec![(0.0f64, 0.0f64); cfg.window];

    for f in 0..n_frames {
        let offset = f * cfg.hop;
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = (samples[offset + i] as f64 * window[i], 0.0);
        }
        fft(&mut buf);

        let mut power = vec![0.0f64; n_bins];
        for (k, p) in power.iter_mut().enumerate() {
            let (re, im) = buf[k];
            *p = re * re + im * im;
        }

        let mut energies = vec![0.0f64; cfg.n_mels];
        for (m, filter) in bank.iter().enumerate() {
            energies[m] = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
        }
        out.push(energies);
    }

    Ok(out)
}
