use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Per-stage bookkeeping collected over a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: String,
    pub samples_in: usize,
    pub samples_out: usize,
    pub sample_rate_out: f64,
    pub elapsed: Duration,
}

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Default)]
struct Metrics {
    stages: Vec<StageRecord>,
    errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_stage(&self, record: StageRecord) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.stages.push(record);
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    /// Stage records in execution order plus the error count.
    pub fn snapshot(&self) -> (Vec<StageRecord>, usize) {
        if let Ok(metrics) = self.inner.lock() {
            (metrics.stages.clone(), metrics.errors)
        } else {
            (Vec::new(), 0)
        }
    }

    pub fn total_elapsed(&self) -> Duration {
        self.snapshot().0.iter().map(|record| record.elapsed).sum()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
