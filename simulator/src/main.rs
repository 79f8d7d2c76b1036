use anyhow::Context;
use clap::Parser;
use output::JsonTraceSink;
use pulsecore::interface::TraceSink;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, MAX_TRACE_POINTS};

mod output;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "LFM pulse-compression experiment driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the signal-to-noise ratio in dB
    #[arg(long, allow_hyphen_values = true)]
    snr_db: Option<f64>,
    /// Directory for trace files and the run report
    #[arg(long, default_value = "plots")]
    output_dir: PathBuf,
    /// Skip writing diagnostic traces
    #[arg(long, default_value_t = false)]
    no_traces: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(args.seed, args.snr_db);

    let runner = Runner::new(workflow_config.clone()).with_traces(!args.no_traces);
    let result = runner.execute()?;

    if !result.traces.is_empty() {
        let mut sink = JsonTraceSink::new(&args.output_dir, MAX_TRACE_POINTS)?;
        for (name, trace) in &result.traces {
            sink.render(trace, name)?;
        }
        println!(
            "Wrote {} traces to {}",
            sink.written().len(),
            args.output_dir.display()
        );
    }

    println!(
        "Run seed={} snr={} dB -> pulses {}, detections {}, compressed len {} at {:.3e} Sps",
        workflow_config.seed,
        workflow_config.snr_db,
        result.placements.len(),
        result.detections.len(),
        result.magnitude.len(),
        result.final_rate
    );
    for record in &result.stage_records {
        println!(
            "  {:8} {:9} -> {:9} samples at {:.3e} Sps in {:?}",
            record.stage, record.samples_in, record.samples_out, record.sample_rate_out, record.elapsed
        );
    }
    for report in &result.slot_reports {
        println!(
            "  slot {:3} offset {:9} -> predicted {:10.2} observed {:6} |y|={:.3}",
            report.slot,
            report.scene_offset,
            report.predicted_index,
            report.observed_index,
            report.magnitude
        );
    }

    let worst = result
        .slot_reports
        .iter()
        .map(|r| r.error())
        .fold(0.0, f64::max);
    let report = format!(
        "seed={} snr_db={} pulses={} detections={} worst_peak_error={:.3} noise_power={:.4} signal_power={:.4e}\n",
        workflow_config.seed,
        workflow_config.snr_db,
        result.placements.len(),
        result.detections.len(),
        worst,
        result.noise_power,
        result.signal_power
    );
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let report_path = args.output_dir.join("run_report.log");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening {}", report_path.display()))?;
    file.write_all(report.as_bytes())?;

    Ok(())
}
