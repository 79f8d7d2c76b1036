use crate::math::convolve::{convolve_strided, decimated_len, output_len, Mode};
use crate::prelude::{
    require_positive, ProcessingStage, Signal, StageConfig, StageError, StageMetadata,
    StageOutput, StageResult,
};
use crate::processing::fir::LowpassFir;
use crate::telemetry::log::LogManager;

/// Repeated low-pass + keep-every-`factor` stages. Each stage uses a full
/// convolution, so the sequence grows by `taps - 1` before it is decimated.
pub struct CascadedDecimator {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl CascadedDecimator {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("decimate"),
        }
    }

    /// Anti-aliasing filter for one stage at `sample_rate`.
    pub fn stage_filter(config: &StageConfig, sample_rate: f64) -> StageResult<LowpassFir> {
        LowpassFir::kaiser(
            sample_rate,
            1.0 / config.decimation_factor as f64,
            config.decimator_transition,
            config.decimator_attenuation_db,
        )
    }
}

impl Default for CascadedDecimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves a sample index through the cascade: each stage delays by
/// `(taps - 1) / 2` input samples, then divides by `factor`.
pub fn propagate_index(index: f64, stage_taps: &[usize], factor: usize) -> f64 {
    stage_taps.iter().fold(index, |position, &taps| {
        (position + taps.saturating_sub(1) as f64 / 2.0) / factor as f64
    })
}

/// Output length of the cascade for an input of `len` samples.
pub fn cascade_len(len: usize, stage_taps: &[usize], factor: usize) -> usize {
    stage_taps.iter().fold(len, |current, &taps| {
        decimated_len(output_len(current, taps, Mode::Full), factor)
    })
}

impl ProcessingStage for CascadedDecimator {
    fn name(&self) -> &'static str {
        "decimate"
    }

    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.decimation_factor < 2 {
            return Err(StageError::InvalidConfig(format!(
                "decimation factor {} must be at least 2",
                config.decimation_factor
            )));
        }
        require_positive("decimator transition width", config.decimator_transition)?;
        require_positive("decimator attenuation", config.decimator_attenuation_db)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Signal) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::InvalidInput("decimator not initialized".into()))?;
        require_positive("sample rate", input.sample_rate)?;
        if input.is_empty() {
            return Err(StageError::InvalidInput("no samples to decimate".into()));
        }

        let factor = config.decimation_factor;
        let input_len = input.len();
        let mut signal = input;
        let mut filter_taps = Vec::with_capacity(config.decimation_stages);

        for stage in 0..config.decimation_stages {
            let fir = Self::stage_filter(config, signal.sample_rate)?;
            let samples = convolve_strided(&signal.samples, &fir.taps, Mode::Full, factor);
            self.logger.detail(&format!(
                "stage {}: {} taps, {} -> {} samples",
                stage + 1,
                fir.len(),
                signal.len(),
                samples.len()
            ));
            filter_taps.push(fir.len());
            signal = Signal::new(samples, signal.sample_rate / factor as f64);
        }

        let group_delay = propagate_index(0.0, &filter_taps, factor);
        self.logger.record(&format!(
            "{} stages of {}: {} -> {} samples, {:.3e} Sps",
            filter_taps.len(),
            factor,
            input_len,
            signal.len(),
            signal.sample_rate
        ));

        Ok(StageOutput {
            signal,
            metadata: StageMetadata {
                notes: vec![format!("group delay {:.3} samples", group_delay)],
                filter_taps,
                group_delay,
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
