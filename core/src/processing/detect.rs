use crate::interface::DetectionRecord;
use crate::math::stats::StatsHelper;
use crate::telemetry::log::LogManager;

/// Threshold detector over a compressed-pulse magnitude trace.
///
/// The threshold is `factor` times the trace RMS. Local maxima above it are
/// kept strongest-first, dropping any within `min_separation` samples of a
/// stronger one.
pub struct PeakDetector {
    factor: f64,
    min_separation: usize,
    logger: LogManager,
}

impl PeakDetector {
    pub fn new(factor: f64, min_separation: usize) -> Self {
        Self {
            factor,
            min_separation,
            logger: LogManager::new("detect"),
        }
    }

    pub fn threshold(&self, magnitude: &[f64]) -> f64 {
        StatsHelper::rms(magnitude) * self.factor
    }

    /// Detections in index order; `sample_rate` converts indices to seconds.
    pub fn detect(&self, magnitude: &[f64], sample_rate: f64) -> Vec<DetectionRecord> {
        let threshold = self.threshold(magnitude);
        let mut candidates: Vec<usize> = (0..magnitude.len())
            .filter(|&idx| {
                let value = magnitude[idx];
                let left = idx.checked_sub(1).map_or(f64::MIN, |i| magnitude[i]);
                let right = magnitude.get(idx + 1).copied().unwrap_or(f64::MIN);
                value > threshold && value >= left && value > right
            })
            .collect();
        candidates.sort_by(|&a, &b| magnitude[b].total_cmp(&magnitude[a]));

        let mut kept: Vec<usize> = Vec::new();
        for idx in candidates {
            if kept.iter().all(|&other| idx.abs_diff(other) >= self.min_separation) {
                kept.push(idx);
            }
        }
        kept.sort_unstable();

        let records: Vec<DetectionRecord> = kept
            .into_iter()
            .map(|idx| {
                DetectionRecord::new(
                    idx,
                    idx as f64 / sample_rate,
                    magnitude[idx],
                    magnitude[idx] / threshold,
                )
            })
            .collect();
        self.logger.record(&format!(
            "{} detections above {:.4}",
            records.len(),
            threshold
        ));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_reports_isolated_peaks_once() {
        let mut trace = vec![0.1; 400];
        trace[50] = 10.0;
        trace[51] = 9.0;
        trace[49] = 7.0;
        trace[200] = 8.0;
        trace[205] = 6.0; // sidelobe-like neighbour inside the separation window

        let detector = PeakDetector::new(4.0, 20);
        let detections = detector.detect(&trace, 100.0);
        let indices: Vec<usize> = detections.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![50, 200]);
        assert!((detections[1].time - 2.0).abs() < 1e-12);
        assert!(detections.iter().all(|d| d.snr > 1.0));
    }

    #[test]
    fn flat_trace_has_no_detections() {
        let detector = PeakDetector::new(2.0, 5);
        assert!(detector.detect(&[1.0; 64], 1.0).is_empty());
        assert!(detector.detect(&[], 1.0).is_empty());
    }
}
