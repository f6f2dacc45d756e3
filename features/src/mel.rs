//! Mel filterbank and the DCT used for cepstral coefficients.

use std::f64::consts::PI;

pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank weights, `[n_mels][n_fft / 2 + 1]`.
///
/// Filters span 0 Hz to Nyquist with centers equally spaced on the mel scale.
pub fn mel_filterbank(n_mels: usize, n_fft: usize, sample_rate: usize) -> Vec<Vec<f64>> {
    let n_bins = n_fft / 2 + 1;
    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sample_rate as f64 / 2.0);

    // n_mels + 2 equally spaced points: left edge, centers, right edge.
    let hz_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_low + i as f64 * (mel_high - mel_low) / (n_mels + 1) as f64))
        .collect();
    let bin_of = |hz: f64| -> usize {
        let bin = (hz * n_fft as f64 / sample_rate as f64).floor() as isize;
        bin.clamp(0, n_bins as isize - 1) as usize
    };

    let mut bank = Vec::with_capacity(n_mels);
    for m in 0..n_mels {
        let left = bin_of(hz_points[m]);
        let center = bin_of(hz_points[m + 1]);
        let right = bin_of(hz_points[m + 2]);

        let mut filter = vec![0.0f64; n_bins];
        if center > left {
            for k in left..=center {
                filter[k] = (k - left) as f64 / (center - left) as f64;
            }
        }
        if right > center {
            for k in center..=right {
                filter[k] = (right - k) as f64 / (right - center) as f64;
            }
        }
        bank.push(filter);
    }
    bank
}

/// Orthonormal DCT-II basis, `[n_out][n_in]`.
///
/// Applied to log mel energies to produce cepstral coefficients.
pub fn dct_basis(n_out: usize, n_in: usize) -> Vec<Vec<f64>> {
    let norm0 = (1.0 / n_in as f64).sqrt();
    let norm = (2.0 / n_in as f64).sqrt();

    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { norm0 } else { norm };
            (0..n_in)
                .map(|j| scale * (PI * k as f64 * (2.0 * j as f64 + 1.0) / (2.0 * n_in as f64)).cos())
                .collect()
        })
        .collect()
}
