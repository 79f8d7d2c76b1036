//! Complex Gaussian noise floor and SNR-matched pulse scaling.

use crate::math::stats::StatsHelper;
use crate::prelude::{StageError, StageResult};
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::FRAC_1_SQRT_2;

/// Noise buffer plus the pulse rescaled to the requested SNR.
#[derive(Debug, Clone)]
pub struct NoiseScene {
    pub noise: Vec<Complex64>,
    pub scaled_chirp: Vec<Complex64>,
    /// Empirical (population) variance of `noise`.
    pub noise_power: f64,
    /// Target signal power, `10^(snr/10) * noise_power`.
    pub signal_power: f64,
}

/// Draws `len` real normals, then `len` more for the imaginary parts, and
/// combines them as `(g1 + i*g2) / sqrt(2)`.
pub fn complex_noise<R: Rng>(rng: &mut R, len: usize) -> Vec<Complex64> {
    let real: Vec<f64> = (0..len).map(|_| rng.sample(StandardNormal)).collect();
    let imag: Vec<f64> = (0..len).map(|_| rng.sample(StandardNormal)).collect();
    real.into_iter()
        .zip(imag)
        .map(|(re, im)| Complex64::new(re * FRAC_1_SQRT_2, im * FRAC_1_SQRT_2))
        .collect()
}

/// Builds the noise floor and scales `chirp` so its empirical power is
/// exactly `10^(snr_db/10)` times the empirical noise power.
pub fn synthesize<R: Rng>(
    rng: &mut R,
    len: usize,
    snr_db: f64,
    chirp: &[Complex64],
) -> StageResult<NoiseScene> {
    if len == 0 {
        return Err(StageError::InvalidConfig("scene must hold at least one sample".into()));
    }
    if !snr_db.is_finite() {
        return Err(StageError::InvalidConfig(format!("SNR {} dB is not finite", snr_db)));
    }
    if chirp.is_empty() {
        return Err(StageError::InvalidConfig("pulse has no samples".into()));
    }

    let noise = complex_noise(rng, len);
    let noise_power = StatsHelper::variance(&noise);
    if noise_power <= 0.0 {
        return Err(StageError::Degenerate(format!(
            "noise floor of {} samples has zero variance",
            len
        )));
    }

    let chirp_std = StatsHelper::std_dev(chirp);
    if chirp_std <= 0.0 {
        return Err(StageError::Degenerate(format!(
            "pulse of {} samples has zero variance",
            chirp.len()
        )));
    }

    let signal_power = 10f64.powf(snr_db / 10.0) * noise_power;
    let scale = signal_power.sqrt() / chirp_std;
    let scaled_chirp = chirp.iter().map(|&s| s * scale).collect();

    Ok(NoiseScene {
        noise,
        scaled_chirp,
        noise_power,
        signal_power,
    })
}
