use serde::Serialize;

/// Canonical sample rate for the entire pipeline, in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Duration every clip is normalized to before feature extraction, in ms.
pub const TARGET_DURATION_MS: u32 = 3_000;

/// Mono audio samples at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Descriptive statistics over a waveform.
#[derive(Debug, Clone, Serialize)]
pub struct AudioStats {
    pub duration_ms: f64,
    pub sample_rate: u32,
    pub mean: f64,
    pub std: f64,
    pub max_abs: f64,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Pads or trims the waveform to exactly `duration_ms`.
    ///
    /// Longer clips keep the centered window; shorter clips are zero-padded
    /// with the padding split evenly and the odd sample going to the tail.
    /// The result is always `sample_rate * duration_ms / 1000` samples.
    pub fn normalize(self, duration_ms: u32) -> Self {
        let target = (self.sample_rate as usize * duration_ms as usize) / 1000;
        let n = self.samples.len();

        let samples = if n > target {
            let start = n / 2 - target / 2;
            self.samples[start..start + target].to_vec()
        } else if n < target {
            let pad = target - n;
            let front = pad / 2;
            let back = pad - front;
            let mut out = Vec::with_capacity(target);
            out.extend(std::iter::repeat(0.0).take(front));
            out.extend_from_slice(&self.samples);
            out.extend(std::iter::repeat(0.0).take(back));
            out
        } else {
            self.samples
        };

        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Computes descriptive statistics. Pure, no side effects.
    pub fn stats(&self) -> AudioStats {
        let n = self.samples.len();
        let mut sum = 0.0f64;
        let mut max_abs = 0.0f64;
        for &s in &self.samples {
            sum += s as f64;
            let a = (s as f64).abs();
            if a > max_abs {
                max_abs = a;
            }
        }
        let mean = if n > 0 { sum / n as f64 } else { 0.0 };

        let mut var_sum = 0.0f64;
        for &s in &self.samples {
            let d = s as f64 - mean;
            var_sum += d * d;
        }
        let std = if n > 0 { (var_sum / n as f64).sqrt() } else { 0.0 };

        AudioStats {
            duration_ms: n as f64 / self.sample_rate as f64 * 1000.0,
            sample_rate: self.sample_rate,
            mean,
            std,
            max_abs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_len(ms: u32) -> usize {
        (SAMPLE_RATE as usize * ms as usize) / 1000
    }

    #[test]
    fn normalize_short_pads_centered() {
        // 1 second of ones into a 3 second window.
        let wav = Waveform::new(vec![1.0; 16_000], SAMPLE_RATE);
        let out = wav.normalize(TARGET_DURATION_MS);

        assert_eq!(out.len(), target_len(TARGET_DURATION_MS));

        // pad = 32000, front = 16000, back = 16000
        let s = out.samples();
        assert_eq!(s[15_999], 0.0);
        assert_eq!(s[16_000], 1.0);
        assert_eq!(s[31_999], 1.0);
        assert_eq!(s[32_000], 0.0);
    }

    #[test]
    fn normalize_odd_padding_goes_to_tail() {
        let wav = Waveform::new(vec![1.0; 3], SAMPLE_RATE);
        let out = wav.normalize(1); // 16 samples target, pad = 13
        assert_eq!(out.len(), 16);

        let s = out.samples();
        // front = 6, back = 7
        assert!(s[..6].iter().all(|&x| x == 0.0));
        assert!(s[6..9].iter().all(|&x| x == 1.0));
        assert!(s[9..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn normalize_long_takes_center() {
        // Ramp so we can verify which window survived.
        let samples: Vec<f32> = (0..96_000).map(|i| i as f32).collect();
        let wav = Waveform::new(samples, SAMPLE_RATE);
        let out = wav.normalize(TARGET_DURATION_MS);

        assert_eq!(out.len(), 48_000);
        // start = 96000/2 - 48000/2 = 24000
        assert_eq!(out.samples()[0], 24_000.0);
        assert_eq!(out.samples()[47_999], 71_999.0);
    }

    #[test]
    fn normalize_exact_is_identity() {
        let samples: Vec<f32> = (0..48_000).map(|i| (i % 7) as f32).collect();
        let wav = Waveform::new(samples.clone(), SAMPLE_RATE);
        let out = wav.normalize(TARGET_DURATION_MS);
        assert_eq!(out.samples(), samples.as_slice());
    }

    #[test]
    fn stats_of_known_signal() {
        let wav = Waveform::new(vec![1.0, -1.0, 1.0, -1.0], SAMPLE_RATE);
        let st = wav.stats();

        assert_eq!(st.sample_rate, SAMPLE_RATE);
        assert!((st.duration_ms - 0.25).abs() < 1e-9);
        assert!(st.mean.abs() < 1e-12);
        assert!((st.std - 1.0).abs() < 1e-12);
        assert!((st.max_abs - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stats_of_empty_waveform() {
        let wav = Waveform::new(vec![], SAMPLE_RATE);
        let st = wav.stats();
        assert_eq!(st.duration_ms, 0.0);
        assert_eq!(st.mean, 0.0);
        assert_eq!(st.std, 0.0);
    }
}
