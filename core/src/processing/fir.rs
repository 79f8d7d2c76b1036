//! FIR filter design for the receive chain.

use crate::math::window;
use crate::prelude::{require_positive, StageError, StageResult};
use num_complex::Complex64;

/// Real low-pass taps plus the rate they were designed at.
#[derive(Debug, Clone)]
pub struct LowpassFir {
    pub taps: Vec<f64>,
    pub sample_rate: f64,
    /// Cutoff in cycles per sample.
    pub cutoff: f64,
    pub beta: f64,
}

impl LowpassFir {
    /// Kaiser windowed sinc with a fixed tap count. The window shape comes
    /// from the attenuation `taps` coefficients can reach over the transition.
    pub fn with_taps(
        taps: usize,
        sample_rate: f64,
        cutoff_hz: f64,
        transition_hz: f64,
    ) -> StageResult<Self> {
        require_positive("sample rate", sample_rate)?;
        require_positive("transition width", transition_hz)?;
        if taps == 0 {
            return Err(StageError::InvalidConfig("filter needs at least one tap".into()));
        }
        let cutoff = normalized_cutoff(cutoff_hz, sample_rate)?;
        let attenuation = window::attenuation_for_taps(taps, transition_hz / sample_rate);
        let beta = window::kaiser_beta(attenuation);
        Ok(Self {
            taps: windowed_sinc(taps, cutoff, beta),
            sample_rate,
            cutoff,
            beta,
        })
    }

    /// Kaiser windowed sinc sized from the attenuation target. `cutoff` and
    /// `transition` are fractions of Nyquist; the tap count is forced odd so
    /// the group delay is a whole number of samples.
    pub fn kaiser(
        sample_rate: f64,
        cutoff: f64,
        transition: f64,
        attenuation_db: f64,
    ) -> StageResult<Self> {
        require_positive("sample rate", sample_rate)?;
        require_positive("transition width", transition)?;
        require_positive("stopband attenuation", attenuation_db)?;
        if !(cutoff > 0.0 && cutoff < 1.0) {
            return Err(StageError::InvalidConfig(format!(
                "cutoff {} must lie strictly between 0 and Nyquist",
                cutoff
            )));
        }
        let mut taps = window::kaiser_taps(attenuation_db, transition / 2.0);
        if taps % 2 == 0 {
            taps += 1;
        }
        let beta = window::kaiser_beta(attenuation_db);
        Ok(Self {
            taps: windowed_sinc(taps, cutoff / 2.0, beta),
            sample_rate,
            cutoff: cutoff / 2.0,
            beta,
        })
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Delay of the linear-phase response, in samples at the design rate.
    pub fn group_delay(&self) -> f64 {
        (self.taps.len().saturating_sub(1)) as f64 / 2.0
    }
}

/// Cutoff in Hz converted to cycles per sample, rejected at or above Nyquist.
fn normalized_cutoff(cutoff_hz: f64, sample_rate: f64) -> StageResult<f64> {
    let cutoff = cutoff_hz / sample_rate;
    if cutoff.is_finite() && cutoff > 0.0 && cutoff < 0.5 {
        Ok(cutoff)
    } else {
        Err(StageError::InvalidConfig(format!(
            "cutoff {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
            cutoff_hz,
            sample_rate / 2.0
        )))
    }
}

/// Sinc low-pass at `cutoff` cycles/sample, windowed and scaled to unit DC gain.
fn windowed_sinc(taps: usize, cutoff: f64, beta: f64) -> Vec<f64> {
    let center = (taps - 1) as f64 / 2.0;
    let window = window::kaiser(taps, beta);
    let mut coefficients: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(n, w)| {
            let x = 2.0 * cutoff * (n as f64 - center);
            2.0 * cutoff * sinc(x) * w
        })
        .collect();

    let sum: f64 = coefficients.iter().sum();
    if sum.abs() > f64::EPSILON {
        coefficients.iter_mut().for_each(|c| *c /= sum);
    }
    coefficients
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let arg = std::f64::consts::PI * x;
        arg.sin() / arg
    }
}

/// Local oscillator at exactly a quarter of the sample rate, `i^k`, tiled
/// from its four exact values.
pub fn quarter_rate_oscillator(length: usize) -> Vec<Complex64> {
    const CYCLE: [Complex64; 4] = [
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 1.0),
        Complex64::new(-1.0, 0.0),
        Complex64::new(0.0, -1.0),
    ];
    CYCLE.iter().copied().cycle().take(length).collect()
}

/// Complex response of `taps` at `frequency` cycles/sample.
pub fn frequency_response<T>(taps: &[T], frequency: f64) -> Complex64
where
    T: Copy + Into<Complex64>,
{
    taps.iter()
        .enumerate()
        .map(|(m, &h)| {
            let phase = -2.0 * std::f64::consts::PI * frequency * m as f64;
            h.into() * Complex64::from_polar(1.0, phase)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillator_cycles_through_four_exact_values() {
        let osc = quarter_rate_oscillator(10);
        assert_eq!(osc.len(), 10);
        assert_eq!(osc[0], Complex64::new(1.0, 0.0));
        assert_eq!(osc[1], Complex64::new(0.0, 1.0));
        assert_eq!(osc[6], Complex64::new(-1.0, 0.0));
        assert_eq!(osc[7], Complex64::new(0.0, -1.0));
        for (k, v) in osc.iter().enumerate() {
            let expected = Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_2 * k as f64);
            assert!((v - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn fixed_tap_lowpass_has_unit_dc_gain() {
        let fir = LowpassFir::with_taps(64, 5e9, 5e9 / 8.0, 1e6).unwrap();
        assert_eq!(fir.len(), 64);
        assert!((fir.taps.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((fir.cutoff - 0.125).abs() < 1e-15);
        assert!((fir.group_delay() - 31.5).abs() < 1e-15);
    }

    #[test]
    fn cutoff_at_nyquist_is_rejected() {
        let err = LowpassFir::with_taps(16, 100.0, 50.0, 1.0).unwrap_err();
        assert!(matches!(err, StageError::InvalidConfig(_)));
        assert!(LowpassFir::kaiser(100.0, 1.0, 0.05, 60.0).is_err());
        assert!(LowpassFir::with_taps(0, 100.0, 10.0, 1.0).is_err());
    }

    #[test]
    fn kaiser_lowpass_meets_stopband() {
        let fir = LowpassFir::kaiser(1.0, 0.2, 0.05, 60.0).unwrap();
        assert_eq!(fir.len() % 2, 1);
        assert!((frequency_response(&fir.taps, 0.0).norm() - 1.0).abs() < 1e-9);

        let passband = frequency_response(&fir.taps, 0.08).norm();
        assert!((passband - 1.0).abs() < 0.01);

        // stopband begins half a transition above the cutoff
        let mut f = 0.1 + 0.0125;
        while f <= 0.5 {
            let gain_db = 20.0 * frequency_response(&fir.taps, f).norm().log10();
            assert!(gain_db < -57.0, "{} dB at {}", gain_db, f);
            f += 0.001;
        }
    }
}
