use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Shared configuration for each processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Tap count of the quarter-rate bandpass filter.
    pub demod_taps: usize,
    /// Transition width of the demodulator low-pass prototype, in Hz.
    pub demod_transition_hz: f64,
    pub decimation_factor: usize,
    pub decimation_stages: usize,
    /// Transition width of each decimation filter, normalized to Nyquist.
    pub decimator_transition: f64,
    pub decimator_attenuation_db: f64,
    /// Pulse width in seconds, used to rebuild the matched-filter reference.
    pub pulse_width: f64,
    /// Chirp bandwidth in Hz.
    pub bandwidth: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            demod_taps: 64,
            demod_transition_hz: 1e6,
            decimation_factor: 5,
            decimation_stages: 3,
            decimator_transition: 0.05,
            decimator_attenuation_db: 60.0,
            pulse_width: 10e-6,
            bandwidth: 8e6,
        }
    }
}

/// Complex samples paired with the rate they were taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub samples: Vec<Complex64>,
    pub sample_rate: f64,
}

impl Signal {
    pub fn new(samples: Vec<Complex64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the samples, in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub signal: Signal,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    /// Tap count of every filter the stage applied, in application order.
    pub filter_taps: Vec<usize>,
    /// Delay the stage introduced, expressed in output samples.
    pub group_delay: f64,
    /// Magnitude trace for stages that end in a detection statistic.
    pub magnitude: Option<Vec<f64>>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("numeric degeneracy: {0}")]
    Degenerate(String),
    #[error("placement overflow: {slots} slots of {pulse_len} samples exceed a scene of {scene_len}")]
    PlacementOverflow {
        slots: usize,
        pulse_len: usize,
        scene_len: usize,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the signal-processing stages of the receive chain.
pub trait ProcessingStage {
    fn name(&self) -> &'static str;
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: Signal) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

/// Rejects rates, widths and frequencies that are zero, negative or not finite.
pub(crate) fn require_positive(name: &str, value: f64) -> StageResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StageError::InvalidConfig(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}
