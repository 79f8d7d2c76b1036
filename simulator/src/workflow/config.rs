use anyhow::Context;
use pulsecore::prelude::StageConfig;
use pulsecore::waveform::{quarter_rate_carrier, ChirpParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fixed parameters of one experiment run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Transmit sample rate in Sps.
    pub sample_rate: f64,
    /// Analysis duration in seconds.
    pub duration: f64,
    pub pulse_width: f64,
    pub bandwidth: f64,
    pub snr_db: f64,
    pub seed: u64,
    pub demod_taps: usize,
    pub demod_transition_hz: f64,
    pub decimation_factor: usize,
    pub decimation_stages: usize,
    pub decimator_transition: f64,
    pub decimator_attenuation_db: f64,
    /// Detection threshold as a multiple of the compressed-trace RMS.
    pub detection_threshold: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sample_rate: 5e9,
            duration: 1e-3,
            pulse_width: 10e-6,
            bandwidth: 8e6,
            snr_db: -5.0,
            seed: 123,
            demod_taps: 64,
            demod_transition_hz: 1e6,
            decimation_factor: 5,
            decimation_stages: 3,
            decimator_transition: 0.05,
            decimator_attenuation_db: 60.0,
            detection_threshold: 6.0,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of a loaded or default config.
    pub fn with_overrides(mut self, seed: Option<u64>, snr_db: Option<f64>) -> Self {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        if let Some(snr_db) = snr_db {
            self.snr_db = snr_db;
        }
        self
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            demod_taps: self.demod_taps,
            demod_transition_hz: self.demod_transition_hz,
            decimation_factor: self.decimation_factor,
            decimation_stages: self.decimation_stages,
            decimator_transition: self.decimator_transition,
            decimator_attenuation_db: self.decimator_attenuation_db,
            pulse_width: self.pulse_width,
            bandwidth: self.bandwidth,
        }
    }

    pub fn chirp_params(&self) -> ChirpParams {
        ChirpParams::new(self.sample_rate, self.pulse_width, self.bandwidth)
    }

    pub fn carrier(&self) -> f64 {
        quarter_rate_carrier(self.sample_rate)
    }

    /// Scene length in samples, `round(fs * T)`.
    pub fn scene_len(&self) -> usize {
        (self.sample_rate * self.duration).round().max(0.0) as usize
    }
}
