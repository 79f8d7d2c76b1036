use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use pulsecore::interface::{DetectionRecord, SlotReport, Trace};
use pulsecore::prelude::{ProcessingStage, Signal, StageConfig, StageOutput};
use pulsecore::processing::decimate::propagate_index;
use pulsecore::processing::demod::DEMOD_DECIMATION;
use pulsecore::processing::{CascadedDecimator, MatchedFilter, PeakDetector, QuadratureDemodulator};
use pulsecore::scene::{self, PulsePlacement};
use pulsecore::telemetry::{LogManager, MetricsRecorder, StageRecord};
use pulsecore::waveform::{chirp, modulate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;

/// Upper bound on points per series handed to a trace sink.
pub const MAX_TRACE_POINTS: usize = 20_000;

/// Half-width, in compressed samples, of the search around a predicted peak.
const PEAK_SEARCH_RADIUS: usize = 3;

pub struct WorkflowResult {
    pub placements: Vec<PulsePlacement>,
    /// Compressed-pulse magnitude at `final_rate`.
    pub magnitude: Vec<f64>,
    pub final_rate: f64,
    pub noise_power: f64,
    pub signal_power: f64,
    pub slot_reports: Vec<SlotReport>,
    pub detections: Vec<DetectionRecord>,
    pub stage_records: Vec<StageRecord>,
    /// Named diagnostic traces, empty unless the runner captures them.
    pub traces: Vec<(String, Trace)>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    capture_traces: bool,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            capture_traces: false,
        }
    }

    pub fn with_traces(mut self, capture: bool) -> Self {
        self.capture_traces = capture;
        self
    }

    /// Runs the experiment with a generator seeded from the config.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.execute_with_rng(&mut rng)
    }

    pub fn execute_with_rng<R: Rng>(&self, rng: &mut R) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;
        let logger = LogManager::new("runner");
        let metrics = MetricsRecorder::new();
        let stage_config = config.to_stage_config();
        let mut traces = Vec::new();

        let params = config.chirp_params();
        let pulse = chirp::generate(&params).context("generating transmit chirp")?;

        let noise_scene = scene::synthesize(rng, config.scene_len(), config.snr_db, &pulse)
            .context("synthesizing noise floor")?;
        logger.record(&format!(
            "noise power {:.4}, signal power {:.4e} ({} dB)",
            noise_scene.noise_power, noise_scene.signal_power, config.snr_db
        ));

        let modulated = modulate(&noise_scene.scaled_chirp, config.sample_rate, config.carrier())
            .context("modulating chirp onto carrier")?;

        if self.capture_traces {
            let fs = config.sample_rate;
            let scaled = &noise_scene.scaled_chirp;
            traces.push(("lfm_time".into(), Trace::time_domain("LFM Time Domain", scaled, fs)));
            traces.push(("lfm_spectrum".into(), Trace::spectrum("LFM Power Spectrum", scaled, fs)));
            traces.push((
                "lfm_carrier_time".into(),
                Trace::time_domain("LFM with Carrier Time Domain", &modulated, fs),
            ));
            traces.push((
                "lfm_carrier_spectrum".into(),
                Trace::spectrum("LFM with Carrier Power Spectrum", &modulated, fs),
            ));
        }

        let slots = scene::slot_count(config.duration, config.pulse_width)
            .context("counting pulse slots")?;
        let mut samples = noise_scene.noise;
        let placements = scene::place_pulses(&mut samples, &modulated, slots, rng)
            .context("placing pulses")?;
        logger.record(&format!("{} of {} slots carry a pulse", placements.len(), slots));

        if self.capture_traces {
            let title = format!("Randomly Placed LFM Pulses; SNR={}dB", config.snr_db);
            let trace = Trace::power_db(&title, &samples, config.sample_rate);
            traces.push(("received".into(), trace.reduced(MAX_TRACE_POINTS)));
        }

        let received = Signal::new(samples, config.sample_rate);
        let demod = run_stage(&mut QuadratureDemodulator::new(), received, &stage_config, &metrics)?;
        let decimated = run_stage(
            &mut CascadedDecimator::new(),
            demod.signal,
            &stage_config,
            &metrics,
        )?;
        let compressed = run_stage(
            &mut MatchedFilter::new(),
            decimated.signal,
            &stage_config,
            &metrics,
        )?;

        let final_rate = compressed.signal.sample_rate;
        let magnitude = compressed
            .metadata
            .magnitude
            .context("matched filter produced no magnitude trace")?;

        let slot_reports: Vec<SlotReport> = placements
            .iter()
            .map(|placement| {
                let at_demod =
                    placement.offset as f64 / DEMOD_DECIMATION as f64 + demod.metadata.group_delay;
                let predicted = propagate_index(
                    at_demod,
                    &decimated.metadata.filter_taps,
                    stage_config.decimation_factor,
                ) + compressed.metadata.group_delay;
                let (observed_index, peak) = local_peak(&magnitude, predicted);
                SlotReport {
                    slot: placement.slot,
                    scene_offset: placement.offset,
                    predicted_index: predicted,
                    observed_index,
                    magnitude: peak,
                }
            })
            .collect();

        let reference_len = compressed.metadata.filter_taps.first().copied().unwrap_or(1);
        let detector = PeakDetector::new(config.detection_threshold, (reference_len / 2).max(1));
        let detections = detector.detect(&magnitude, final_rate);

        if self.capture_traces {
            let trace = Trace::magnitude("Pulse Compression Output", &magnitude, final_rate);
            traces.push(("compressed".into(), trace.reduced(MAX_TRACE_POINTS)));
        }

        let (stage_records, errors) = metrics.snapshot();
        for record in &stage_records {
            logger.detail(&format!(
                "{}: {} -> {} samples in {:?}",
                record.stage, record.samples_in, record.samples_out, record.elapsed
            ));
        }
        logger.record(&format!(
            "{} detections, {} stage errors, {:?} in stages",
            detections.len(),
            errors,
            metrics.total_elapsed()
        ));

        Ok(WorkflowResult {
            placements,
            magnitude,
            final_rate,
            noise_power: noise_scene.noise_power,
            signal_power: noise_scene.signal_power,
            slot_reports,
            detections,
            stage_records,
            traces,
        })
    }
}

fn run_stage<S: ProcessingStage>(
    stage: &mut S,
    input: Signal,
    config: &StageConfig,
    metrics: &MetricsRecorder,
) -> anyhow::Result<StageOutput> {
    let name = stage.name();
    let samples_in = input.len();
    let started = Instant::now();

    stage
        .initialize(config)
        .with_context(|| format!("initializing {} stage", name))?;
    let result = stage.execute(input);
    stage.cleanup();

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            metrics.record_error();
            return Err(err).with_context(|| format!("executing {} stage", name));
        }
    };

    metrics.record_stage(StageRecord {
        stage: name.to_string(),
        samples_in,
        samples_out: output.signal.len(),
        sample_rate_out: output.signal.sample_rate,
        elapsed: started.elapsed(),
    });
    Ok(output)
}

/// Strongest sample within `PEAK_SEARCH_RADIUS` of `predicted`.
fn local_peak(magnitude: &[f64], predicted: f64) -> (usize, f64) {
    if magnitude.is_empty() {
        return (0, 0.0);
    }
    let center = predicted.round().max(0.0) as usize;
    let last = magnitude.len() - 1;
    let end = (center + PEAK_SEARCH_RADIUS).min(last);
    // past the end, keep a full-width window ending on the last sample
    let start = if center <= last {
        center.saturating_sub(PEAK_SEARCH_RADIUS)
    } else {
        end.saturating_sub(2 * PEAK_SEARCH_RADIUS)
    };
    (start..=end)
        .map(|idx| (idx, magnitude[idx]))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((start, magnitude[start]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsecore::math::stats::StatsHelper;
    use pulsecore::prelude::StageError;
    use pulsecore::processing::decimate::cascade_len;

    fn short_config() -> WorkflowConfig {
        WorkflowConfig {
            duration: 1e-4,
            snr_db: -5.0,
            ..Default::default()
        }
    }

    fn stage_error(err: &anyhow::Error) -> &StageError {
        err.downcast_ref::<StageError>()
            .expect("error should carry a StageError")
    }

    #[test]
    fn reference_scenario_peaks_at_mapped_slot_offsets() {
        let cfg = WorkflowConfig {
            snr_db: -20.0,
            seed: 123,
            ..Default::default()
        };
        let result = Runner::new(cfg).execute().unwrap();

        assert!((result.final_rate - 10e6).abs() < 1e-6);
        assert_eq!(result.magnitude.len(), cascade_len(1_250_000, &[147, 147, 147], 5));
        assert!(!result.placements.is_empty());
        assert_eq!(result.slot_reports.len(), result.placements.len());

        for report in &result.slot_reports {
            assert_eq!(report.scene_offset, report.slot * 50_000);
            // first sample of the pulse at the final rate, before filter delays
            let nominal = (report.slot * 50_000) as f64 / 500.0;
            assert!(report.predicted_index - nominal > 50.0 && report.predicted_index - nominal < 70.0);
            assert!(report.error() <= 1.0, "slot {}: {:?}", report.slot, report);
        }

        // pulses stand well clear of the empty slots
        let median = StatsHelper::median(&result.magnitude);
        assert!(result
            .slot_reports
            .iter()
            .all(|report| report.magnitude > 5.0 * median));

        assert_eq!(result.detections.len(), result.placements.len());
        for (detection, report) in result.detections.iter().zip(&result.slot_reports) {
            assert!(detection.index.abs_diff(report.observed_index) <= 1);
        }

        let stages: Vec<&str> = result.stage_records.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, vec!["demod", "decimate", "matched"]);
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let first = Runner::new(short_config()).execute().unwrap();
        let second = Runner::new(short_config()).execute().unwrap();
        assert_eq!(first.placements, second.placements);
        assert_eq!(first.magnitude, second.magnitude);
        assert_eq!(first.noise_power, second.noise_power);

        let third = Runner::new(short_config().with_overrides(Some(124), None))
            .execute()
            .unwrap();
        assert_ne!(first.magnitude, third.magnitude);
    }

    #[test]
    fn captured_traces_are_bounded() {
        let result = Runner::new(short_config()).with_traces(true).execute().unwrap();
        let names: Vec<&str> = result.traces.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "lfm_time",
                "lfm_spectrum",
                "lfm_carrier_time",
                "lfm_carrier_spectrum",
                "received",
                "compressed"
            ]
        );
        let (_, received) = &result.traces[4];
        assert!(received.point_count() <= MAX_TRACE_POINTS);
    }

    #[test]
    fn overflowing_slots_abort_the_run() {
        let cfg = WorkflowConfig {
            duration: 1.06e-4,
            ..Default::default()
        };
        let err = Runner::new(cfg).execute().err().unwrap();
        assert_eq!(
            stage_error(&err),
            &StageError::PlacementOverflow {
                slots: 11,
                pulse_len: 50_000,
                scene_len: 530_000,
            }
        );
    }

    #[test]
    fn single_sample_pulse_is_reported_as_degenerate() {
        let cfg = WorkflowConfig {
            duration: 1e-6,
            pulse_width: 2e-10,
            ..Default::default()
        };
        let err = Runner::new(cfg).execute().err().unwrap();
        assert!(matches!(stage_error(&err), StageError::Degenerate(_)));
    }

    #[test]
    fn invalid_bandwidth_is_a_configuration_error() {
        let cfg = WorkflowConfig {
            bandwidth: -1.0,
            ..short_config()
        };
        let err = Runner::new(cfg).execute().err().unwrap();
        assert!(matches!(stage_error(&err), StageError::InvalidConfig(_)));
    }

    #[test]
    fn local_peak_clamps_to_trace_bounds() {
        let trace = [0.0, 1.0, 5.0, 2.0];
        assert_eq!(local_peak(&trace, 10.0), (2, 5.0));
        assert_eq!(local_peak(&trace, -4.0), (2, 5.0));
        assert_eq!(local_peak(&[], 1.0), (0, 0.0));

        let long: Vec<f64> = (0..20).map(|k| if k == 14 { 7.0 } else { 1.0 }).collect();
        assert_eq!(local_peak(&long, 10.0).1, 1.0);
        assert_eq!(local_peak(&long, 11.0), (14, 7.0));
        assert_eq!(local_peak(&long, 23.0), (14, 7.0));
        assert_eq!(local_peak(&long, 40.0), (14, 7.0));
    }
}
