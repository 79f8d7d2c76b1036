use crate::math::convolve::{convolve_strided, Mode};
use crate::prelude::{
    require_positive, ProcessingStage, Signal, StageConfig, StageError, StageMetadata,
    StageOutput, StageResult,
};
use crate::processing::fir::{quarter_rate_oscillator, LowpassFir};
use crate::telemetry::log::LogManager;
use num_complex::Complex64;

/// Output rate is the input rate over this factor.
pub const DEMOD_DECIMATION: usize = 4;

/// Quadrature demodulator for a carrier at exactly a quarter of the sample
/// rate. A low-pass prototype with cutoff `fs/8` is shifted onto the carrier
/// by the `{1, i, -1, -i}` oscillator, applied as one same-length
/// convolution, and every fourth output is kept.
pub struct QuadratureDemodulator {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl QuadratureDemodulator {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("demod"),
        }
    }

    /// Complex bandpass taps centred on `fs/4`.
    pub fn bandpass(taps: usize, sample_rate: f64, transition_hz: f64) -> StageResult<Vec<Complex64>> {
        let prototype = LowpassFir::with_taps(taps, sample_rate, sample_rate / 8.0, transition_hz)?;
        Ok(prototype
            .taps
            .iter()
            .zip(quarter_rate_oscillator(taps))
            .map(|(&h, osc)| osc * h)
            .collect())
    }
}

impl Default for QuadratureDemodulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for QuadratureDemodulator {
    fn name(&self) -> &'static str {
        "demod"
    }

    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.demod_taps == 0 {
            return Err(StageError::InvalidConfig("demodulator needs at least one tap".into()));
        }
        require_positive("demodulator transition width", config.demod_transition_hz)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Signal) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::InvalidInput("demodulator not initialized".into()))?;
        require_positive("sample rate", input.sample_rate)?;
        if input.is_empty() {
            return Err(StageError::InvalidInput("no samples to demodulate".into()));
        }

        let taps = Self::bandpass(
            config.demod_taps,
            input.sample_rate,
            config.demod_transition_hz,
        )?;
        self.logger.detail(&format!(
            "{} bandpass taps at {:.3e} Sps",
            taps.len(),
            input.sample_rate
        ));

        let samples = convolve_strided(&input.samples, &taps, Mode::Same, DEMOD_DECIMATION);
        let sample_rate = input.sample_rate / DEMOD_DECIMATION as f64;

        // centre of an even-length filter sits half a sample past the same-mode offset
        let center = (taps.len() - 1) as f64 / 2.0;
        let offset = ((taps.len() - 1) / 2) as f64;
        let group_delay = (center - offset) / DEMOD_DECIMATION as f64;

        self.logger.record(&format!(
            "{} -> {} samples, {:.3e} Sps",
            input.len(),
            samples.len(),
            sample_rate
        ));

        Ok(StageOutput {
            signal: Signal::new(samples, sample_rate),
            metadata: StageMetadata {
                filter_taps: vec![taps.len()],
                group_delay,
                notes: vec![format!("carrier {:.3e} Hz removed", input.sample_rate / 4.0)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fft::{power_spectrum_db, shifted_frequencies};
    use crate::math::stats::StatsHelper;
    use std::f64::consts::PI;

    const FS: f64 = 4000.0;

    fn tone(frequency: f64, len: usize) -> Signal {
        let samples = (0..len)
            .map(|k| Complex64::from_polar(1.0, 2.0 * PI * frequency * k as f64 / FS))
            .collect();
        Signal::new(samples, FS)
    }

    fn demodulator() -> QuadratureDemodulator {
        let mut stage = QuadratureDemodulator::new();
        let config = StageConfig {
            demod_taps: 64,
            demod_transition_hz: 100.0,
            ..Default::default()
        };
        stage.initialize(&config).unwrap();
        stage
    }

    fn peak_frequency(samples: &[Complex64], rate: f64) -> f64 {
        let db = power_spectrum_db(samples);
        let freqs = shifted_frequencies(samples.len(), rate);
        let (idx, _) = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        freqs[idx]
    }

    #[test]
    fn quarter_rate_tone_lands_at_dc() {
        let mut stage = demodulator();
        let output = stage.execute(tone(FS / 4.0, 4096)).unwrap();
        assert_eq!(output.signal.len(), 1024);
        assert_eq!(output.signal.sample_rate, 1000.0);

        let middle = &output.signal.samples[12..1012];
        let first = middle[0];
        assert!((first.norm() - 1.0).abs() < 1e-9);
        assert!(middle.iter().all(|v| (v - first).norm() < 1e-9));
        assert_eq!(peak_frequency(middle, 1000.0), 0.0);
        stage.cleanup();
    }

    #[test]
    fn offset_from_carrier_is_preserved_at_baseband() {
        let mut stage = demodulator();
        let output = stage.execute(tone(FS / 4.0 + 50.0, 4096)).unwrap();
        let middle = &output.signal.samples[12..1012];
        assert_eq!(peak_frequency(middle, 1000.0), 50.0);
    }

    #[test]
    fn image_band_is_rejected() {
        let mut stage = demodulator();
        let output = stage.execute(tone(0.0, 4096)).unwrap();
        let middle: Vec<f64> = output.signal.samples[12..1012]
            .iter()
            .map(|v| v.norm())
            .collect();
        assert!(StatsHelper::rms(&middle) < 0.1);
    }

    #[test]
    fn bandpass_has_unit_gain_at_carrier() {
        let taps = QuadratureDemodulator::bandpass(64, FS, 100.0).unwrap();
        let gain = crate::processing::fir::frequency_response(&taps, 0.25);
        assert!((gain.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn execute_requires_initialization_and_samples() {
        let mut stage = QuadratureDemodulator::new();
        assert!(stage.execute(tone(FS / 4.0, 16)).is_err());

        let mut stage = demodulator();
        let err = stage.execute(Signal::new(Vec::new(), FS)).unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }
}
