use crate::math::convolve::correlate_same;
use crate::prelude::{
    require_positive, ProcessingStage, Signal, StageConfig, StageError, StageMetadata,
    StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;
use crate::waveform::chirp::{self, ChirpParams};
use num_complex::Complex64;

/// Pulse compression against a chirp regenerated at the input's rate.
///
/// The output signal holds the complex correlation; the detection statistic
/// (its magnitude) is carried in `metadata.magnitude`.
pub struct MatchedFilter {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl MatchedFilter {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("matched"),
        }
    }

    /// Reference pulse for a signal sampled at `sample_rate`.
    pub fn reference(config: &StageConfig, sample_rate: f64) -> StageResult<Vec<Complex64>> {
        chirp::generate(&ChirpParams::new(sample_rate, config.pulse_width, config.bandwidth))
    }
}

impl Default for MatchedFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Index offset between a pulse's first sample and its correlation peak.
pub fn peak_offset(reference_len: usize) -> usize {
    reference_len / 2
}

/// `|correlate_same(signal, reference)|`.
pub fn compress(signal: &[Complex64], reference: &[Complex64]) -> StageResult<Vec<f64>> {
    if reference.is_empty() {
        return Err(StageError::InvalidConfig("matched filter reference is empty".into()));
    }
    Ok(correlate_same(signal, reference)
        .iter()
        .map(|v| v.norm())
        .collect())
}

impl ProcessingStage for MatchedFilter {
    fn name(&self) -> &'static str {
        "matched"
    }

    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        require_positive("pulse width", config.pulse_width)?;
        require_positive("bandwidth", config.bandwidth)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Signal) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::InvalidInput("matched filter not initialized".into()))?;
        if input.is_empty() {
            return Err(StageError::InvalidInput("no samples to compress".into()));
        }

        let reference = Self::reference(config, input.sample_rate)?;
        let correlation = correlate_same(&input.samples, &reference);
        let magnitude: Vec<f64> = correlation.iter().map(|v| v.norm()).collect();
        let peak = magnitude.iter().cloned().fold(0.0, f64::max);
        self.logger.record(&format!(
            "{}-sample reference, peak magnitude {:.4}",
            reference.len(),
            peak
        ));

        Ok(StageOutput {
            signal: Signal::new(correlation, input.sample_rate),
            metadata: StageMetadata {
                filter_taps: vec![reference.len()],
                group_delay: peak_offset(reference.len()) as f64,
                magnitude: Some(magnitude),
                notes: vec![format!("peak {:.4}", peak)],
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
