//! Radix-2 FFT on (re, im) pairs, no complex-number dependency.

use std::f64::consts::PI;

/// In-place iterative Cooley-Tukey FFT. Length must be a power of two.
pub fn fft(buf: &mut [(f64, f64)]) {
    let n = buf.len();
    debug_assert!(n.is_power_of_two());
    if n <= 1 {
        return;
    }

    // Bit-reversal reordering.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buf.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let theta = -2.0 * PI / len as f64;
        let (w_re, w_im) = (theta.cos(), theta.sin());

        for chunk in buf.chunks_exact_mut(len) {
            let (mut cur_re, mut cur_im) = (1.0f64, 0.0f64);
            for k in 0..half {
                let (a_re, a_im) = chunk[k];
                let (b_re, b_im) = chunk[k + half];
                let t_re = cur_re * b_re - cur_im * b_im;
                let t_im = cur_re * b_im + cur_im * b_re;

                chunk[k] = (a_re + t_re, a_im + t_im);
                chunk[k + half] = (a_re - t_re, a_im - t_im);

                let next_re = cur_re * w_re - cur_im * w_im;
                let next_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
                cur_im = next_im;
            }
        }
        len <<= 1;
    }
}

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}
