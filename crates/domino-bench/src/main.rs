use std::path::PathBuf;

use clap::Parser;

use domino_bench::calibration::CalibrationRunner;
use domino_bench::config::{BenchmarkConfig, ResolvedOutputs};
use domino_bench::logging::init_telemetry;

/// Calibration harness for the domino probability oracle.
#[derive(Debug, Parser)]
#[command(
    name = "domino-bench",
    author,
    version,
    about = "Checks sampled tile probabilities against exact references"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/calibration.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of sampling trials per scenario.
    #[arg(long, value_name = "TRIALS")]
    trials: Option<usize>,

    /// Override the base RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no scenario is evaluated).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(trials) = cli.trials {
        config.inference.trials = trials;
    }

    if let Some(seed) = cli.seed {
        config.inference.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let scenario_count = config.scenarios.len();
    let run_id = config.run_id.clone();
    let trials = config.inference.trials;

    println!(
        "Loaded configuration '{run_id}' with {scenario_count} scenario{} ({trials} trials)",
        if scenario_count == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: calibration skipped.");
        return Ok(());
    }

    let _telemetry = init_telemetry(&config.logging, &outputs)?;
    let runner = CalibrationRunner::new(config, outputs);
    let summary = runner.run()?;

    println!(
        "Calibration complete for '{run_id}' (seed {}): {} of {} scenarios passed, {} rows at {}",
        summary.seed,
        summary.passed,
        summary.scenarios,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    if summary.failed() > 0 {
        anyhow::bail!("{} scenario(s) failed calibration", summary.failed());
    }
    Ok(())
}
