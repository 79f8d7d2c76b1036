use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse.
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            forward,
            inverse,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform; input is zero-padded or truncated to the plan size.
    pub fn forward(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = self.fit(input);
        self.forward.process(&mut buffer);
        buffer
    }

    /// Inverse transform scaled by `1/n`, so `inverse(forward(x)) == x`.
    pub fn inverse(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = self.fit(input);
        self.inverse.process(&mut buffer);
        let scale = 1.0 / self.size.max(1) as f64;
        buffer.iter_mut().for_each(|v| *v *= scale);
        buffer
    }

    fn fit(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Complex64::zero());
        buffer
    }
}

/// Rotates a spectrum so the zero-frequency bin sits in the middle.
pub fn fftshift<T: Clone>(values: &[T]) -> Vec<T> {
    let mut shifted = values.to_vec();
    shifted.rotate_right(values.len() / 2);
    shifted
}

/// Bin frequencies in Hz matching `fftshift` ordering.
pub fn shifted_frequencies(size: usize, sample_rate: f64) -> Vec<f64> {
    let half = (size / 2) as isize;
    let step = sample_rate / size.max(1) as f64;
    (0..size as isize).map(|k| (k - half) as f64 * step).collect()
}

/// Power spectrum in dBFS: `20 log10(|fftshift(fft(x)) / n| + eps)`.
pub fn power_spectrum_db(samples: &[Complex64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let helper = FftHelper::new(samples.len());
    let n = samples.len() as f64;
    let spectrum = helper.forward(samples);
    fftshift(&spectrum)
        .iter()
        .map(|&bin| 20.0 * ((bin / n).norm() + f64::EPSILON).log10())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_helper_returns_same_length() {
        let helper = FftHelper::new(4);
        let input: Vec<Complex64> = [1.0, 0.0, -1.0, 0.0]
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        let output = helper.forward(&input);
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn inverse_undoes_forward() {
        let helper = FftHelper::new(6);
        let input: Vec<Complex64> = (0..6)
            .map(|k| Complex64::new(k as f64, -(k as f64) * 0.5))
            .collect();
        let restored = helper.inverse(&helper.forward(&input));
        for (a, b) in input.iter().zip(restored.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn fftshift_centers_dc() {
        assert_eq!(fftshift(&[0, 1, 2, 3]), vec![2, 3, 0, 1]);
        assert_eq!(fftshift(&[0, 1, 2, 3, 4]), vec![3, 4, 0, 1, 2]);
        let freqs = shifted_frequencies(4, 8.0);
        assert_eq!(freqs, vec![-4.0, -2.0, 0.0, 2.0]);
    }

    #[test]
    fn power_spectrum_of_unit_tone_peaks_at_zero_dbfs() {
        let n = 16;
        let tone: Vec<Complex64> = (0..n)
            .map(|k| Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * 2.0 * k as f64 / n as f64))
            .collect();
        let db = power_spectrum_db(&tone);
        let freqs = shifted_frequencies(n, n as f64);
        let (peak, _) = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(freqs[peak], 2.0);
        assert!(db[peak].abs() < 1e-9);
    }
}
