use serde::{Deserialize, Serialize};

/// Peak found in a compressed-pulse trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Sample index in the compressed trace.
    pub index: usize,
    /// Time of the peak in seconds from the start of the trace.
    pub time: f64,
    pub magnitude: f64,
    /// Magnitude over the detection threshold.
    pub snr: f64,
}

impl DetectionRecord {
    pub fn new(index: usize, time: f64, magnitude: f64, snr: f64) -> Self {
        Self {
            index,
            time,
            magnitude,
            snr,
        }
    }
}

/// Where a placed pulse was expected in the compressed trace and what was
/// found there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub slot: usize,
    /// Offset of the pulse in the transmitted scene, in samples.
    pub scene_offset: usize,
    /// Predicted peak index after demodulation, decimation and compression.
    pub predicted_index: f64,
    /// Strongest sample within the search window around the prediction.
    pub observed_index: usize,
    pub magnitude: f64,
}

impl SlotReport {
    /// Distance between the observed and predicted peak, in samples.
    pub fn error(&self) -> f64 {
        (self.observed_index as f64 - self.predicted_index).abs()
    }
}
