use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Targets whose events make up the calibration telemetry.
const TELEMETRY_TARGETS: [&str; 4] = [
    "domino_core::constraint",
    "domino_core::inference",
    "domino_core::oracle",
    "domino_bench::calibration",
];

/// Keeps the telemetry writer flushing until the run finishes.
pub struct TelemetrySink {
    _guard: WorkerGuard,
    pub path: PathBuf,
}

/// Filter used when `RUST_LOG` is unset: telemetry targets at `level`,
/// everything else at `warn`.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        TELEMETRY_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

fn telemetry_filter(level: Level) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directives(level))
            .context("building the telemetry filter"),
    }
}

/// Streams constraint and inference events as JSON lines into the report
/// directory. Returns `None` when structured logging is off.
pub fn init_telemetry(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<TelemetrySink>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let report_dir = outputs.report_dir();
    fs::create_dir_all(&report_dir)
        .with_context(|| format!("creating report directory {}", report_dir.display()))?;

    let path = report_dir.join("telemetry.jsonl");
    let file =
        File::create(&path).with_context(|| format!("creating telemetry file {}", path.display()))?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let filter = telemetry_filter(logging.level().unwrap_or(Level::INFO))?;
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Tests may have installed one already.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(TelemetrySink {
        _guard: guard,
        path,
    }))
}
