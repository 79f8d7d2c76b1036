//! Direct and FFT-based convolution.
//!
//! The direct routines use the usual array conventions: `Full` yields
//! `len(x) + len(h) - 1` samples and `Same` yields `len(x)` samples taken
//! from the full result starting at `(len(h) - 1) / 2`.

use crate::math::fft::FftHelper;
use num_complex::Complex64;
use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Same,
}

/// Number of samples `convolve` returns for the given lengths.
pub fn output_len(signal_len: usize, taps_len: usize, mode: Mode) -> usize {
    if signal_len == 0 || taps_len == 0 {
        return 0;
    }
    match mode {
        Mode::Full => signal_len + taps_len - 1,
        Mode::Same => signal_len,
    }
}

/// Number of samples kept when every `step`-th sample of `len` is retained.
pub fn decimated_len(len: usize, step: usize) -> usize {
    let step = step.max(1);
    (len + step - 1) / step
}

pub fn convolve<T>(signal: &[Complex64], taps: &[T], mode: Mode) -> Vec<Complex64>
where
    T: Copy,
    Complex64: Mul<T, Output = Complex64>,
{
    convolve_strided(signal, taps, mode, 1)
}

/// Equivalent to `decimate(&convolve(signal, taps, mode), step)` but only
/// evaluates the outputs that survive decimation.
pub fn convolve_strided<T>(signal: &[Complex64], taps: &[T], mode: Mode, step: usize) -> Vec<Complex64>
where
    T: Copy,
    Complex64: Mul<T, Output = Complex64>,
{
    let step = step.max(1);
    let len = output_len(signal.len(), taps.len(), mode);
    let offset = match mode {
        Mode::Full => 0,
        Mode::Same => (taps.len().saturating_sub(1)) / 2,
    };

    (0..len)
        .step_by(step)
        .map(|k| full_sample(signal, taps, k + offset))
        .collect()
}

/// Sample `j` of the full linear convolution.
#[inline]
fn full_sample<T>(signal: &[Complex64], taps: &[T], j: usize) -> Complex64
where
    T: Copy,
    Complex64: Mul<T, Output = Complex64>,
{
    let first = j.saturating_sub(taps.len() - 1);
    let last = j.min(signal.len() - 1);
    let mut acc = Complex64::new(0.0, 0.0);
    for i in first..=last {
        acc += signal[i] * taps[j - i];
    }
    acc
}

/// Keeps every `step`-th sample starting at index 0.
pub fn decimate(signal: &[Complex64], step: usize) -> Vec<Complex64> {
    signal.iter().step_by(step.max(1)).copied().collect()
}

/// Centered cross-correlation `c[k] = sum_m x[k - ceil((M-1)/2) + m] * conj(r[m])`,
/// the same length as `signal`.
pub fn correlate_same(signal: &[Complex64], reference: &[Complex64]) -> Vec<Complex64> {
    let kernel: Vec<Complex64> = reference.iter().rev().map(|r| r.conj()).collect();
    convolve(signal, &kernel, Mode::Same)
}

/// Linear convolution through zero-padded FFTs; matches `convolve(.., Mode::Full)`.
pub fn fft_convolve(signal: &[Complex64], taps: &[Complex64]) -> Vec<Complex64> {
    let len = output_len(signal.len(), taps.len(), Mode::Full);
    if len == 0 {
        return Vec::new();
    }
    circular_convolve(signal, taps, len)
}

/// `ifft(fft(a) * fft(b))` at transform size `size`; inputs are zero-padded
/// or truncated to `size`.
pub fn circular_convolve(a: &[Complex64], b: &[Complex64], size: usize) -> Vec<Complex64> {
    if size == 0 {
        return Vec::new();
    }
    let helper = FftHelper::new(size);
    let spectrum_a = helper.forward(a);
    let spectrum_b = helper.forward(b);
    let product: Vec<Complex64> = spectrum_a
        .iter()
        .zip(spectrum_b.iter())
        .map(|(x, y)| x * y)
        .collect();
    helper.inverse(&product)
}
