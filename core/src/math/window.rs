//! Kaiser window and the Kaiser design-rule estimates.
//!
//! Transition widths here are in cycles per sample (0 to 0.5).

/// Kaiser window of `length` samples with shape parameter `beta`.
pub fn kaiser(length: usize, beta: f64) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let half = (length - 1) as f64 / 2.0;
    let norm = bessel_i0(beta);
    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / norm
        })
        .collect()
}

/// Kaiser beta for a stopband attenuation in dB.
pub fn kaiser_beta(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

/// Transition-width coefficient of the Kaiser length estimate, `2.285 * 2pi`.
const KAISER_WIDTH: f64 = 2.285 * 2.0 * std::f64::consts::PI;

/// Tap count needed to reach `attenuation_db` over `transition` cycles/sample.
pub fn kaiser_taps(attenuation_db: f64, transition: f64) -> usize {
    let order = (attenuation_db - 7.95) / (KAISER_WIDTH * transition);
    (order + 1.0).ceil().max(1.0) as usize
}

/// Attenuation that `taps` coefficients can reach over `transition`
/// cycles/sample; the inverse of [`kaiser_taps`].
pub fn attenuation_for_taps(taps: usize, transition: f64) -> f64 {
    7.95 + KAISER_WIDTH * transition * taps.saturating_sub(1) as f64
}

/// Modified Bessel function of the first kind, order zero (power series).
fn bessel_i0(x: f64) -> f64 {
    let quarter_sq = x * x / 4.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term > sum * 1e-17 {
        term *= quarter_sq / (k * k);
        sum += term;
        k += 1.0;
    }
    sum
}
