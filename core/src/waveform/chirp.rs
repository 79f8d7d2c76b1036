use crate::prelude::{require_positive, StageError, StageResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Parameters of a baseband linear-FM pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChirpParams {
    /// Sample rate in Sps.
    pub sample_rate: f64,
    /// Pulse width in seconds.
    pub pulse_width: f64,
    /// Swept bandwidth in Hz.
    pub bandwidth: f64,
}

impl ChirpParams {
    pub fn new(sample_rate: f64, pulse_width: f64, bandwidth: f64) -> Self {
        Self {
            sample_rate,
            pulse_width,
            bandwidth,
        }
    }

    pub fn validate(&self) -> StageResult<()> {
        require_positive("sample rate", self.sample_rate)?;
        require_positive("pulse width", self.pulse_width)?;
        require_positive("bandwidth", self.bandwidth)
    }

    /// Pulse length in samples, `round(fs * pw)`.
    pub fn len(&self) -> usize {
        (self.sample_rate * self.pulse_width).round() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same pulse described at another sample rate.
    pub fn at_rate(&self, sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..*self
        }
    }
}

/// Complex baseband LFM: `exp(i*pi*(bw/pw)*t^2)` for `t = -pw/2 + k/fs`.
pub fn generate(params: &ChirpParams) -> StageResult<Vec<Complex64>> {
    params.validate()?;
    let len = params.len();
    if len == 0 {
        return Err(StageError::InvalidConfig(format!(
            "pulse width {} s is shorter than one sample at {} Sps",
            params.pulse_width, params.sample_rate
        )));
    }

    let rate = params.bandwidth / params.pulse_width;
    let start = -params.pulse_width / 2.0;
    Ok((0..len)
        .map(|k| {
            let t = start + k as f64 / params.sample_rate;
            Complex64::from_polar(1.0, PI * rate * t * t)
        })
        .collect())
}
