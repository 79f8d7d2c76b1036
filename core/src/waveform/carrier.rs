use crate::prelude::{require_positive, StageError, StageResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Shifts `samples` up by `carrier` Hz: `y[k] = x[k] * exp(2*pi*i*fc*k/fs)`.
pub fn modulate(samples: &[Complex64], sample_rate: f64, carrier: f64) -> StageResult<Vec<Complex64>> {
    require_positive("sample rate", sample_rate)?;
    if !carrier.is_finite() || carrier.abs() >= sample_rate / 2.0 {
        return Err(StageError::InvalidConfig(format!(
            "carrier {} Hz must lie inside Nyquist ({} Hz)",
            carrier,
            sample_rate / 2.0
        )));
    }

    let step = 2.0 * PI * carrier / sample_rate;
    Ok(samples
        .iter()
        .enumerate()
        .map(|(k, &x)| x * Complex64::from_polar(1.0, step * k as f64))
        .collect())
}

/// Carrier used by the experiment; a quarter of the sample rate keeps the
/// receive oscillator on the exact values `{1, i, -1, -i}`.
pub fn quarter_rate_carrier(sample_rate: f64) -> f64 {
    sample_rate / 4.0
}
