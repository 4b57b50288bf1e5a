mod report;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use domino_core::inference::{EXACT_CEILING, marginals};
use domino_core::inference::telemetry::TableMetrics;
use domino_core::{GameRecord, InferenceConfig, OracleError, Player, ProbabilityTable};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{BenchmarkConfig, ResolvedOutputs, ScenarioConfig};

/// Row and column sums must match their targets to this precision.
const SUM_EPSILON: f64 = 1e-6;

/// Replays each configured scenario and checks the sampler against a reference table.
pub struct CalibrationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    seed: u64,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub scenarios: usize,
    pub passed: usize,
    pub rows_written: usize,
    pub seed: u64,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.scenarios - self.passed
    }
}

/// One JSONL row per scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    pub run_id: String,
    pub scenario: String,
    pub actions: usize,
    pub unknown_tiles: usize,
    pub trials: usize,
    pub seed: u64,
    pub method: Option<String>,
    pub reference_method: Option<String>,
    pub max_abs_deviation: Option<f64>,
    pub mean_abs_deviation: Option<f64>,
    pub max_column_error: Option<f64>,
    pub max_row_error: Option<f64>,
    pub acceptance_ratio: Option<f64>,
    pub entropy: Option<[f64; 3]>,
    pub certain_tiles: Option<[usize; 3]>,
    pub passed: bool,
    pub error: Option<String>,
}

impl CalibrationRunner {
    /// Build a runner from a validated configuration. The base seed is fixed here
    /// so every scenario in the run shares it.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Self {
        let seed = config.inference.seed.unwrap_or_else(rand::random);
        Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Evaluate every scenario, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rows = Vec::with_capacity(self.config.scenarios.len());

        for scenario in &self.config.scenarios {
            let row = self.evaluate(scenario);
            event!(
                target: "domino_bench::calibration",
                Level::INFO,
                run_id = %self.config.run_id,
                scenario = %row.scenario,
                unknown = row.unknown_tiles,
                max_abs_deviation = row.max_abs_deviation.unwrap_or(f64::NAN),
                passed = row.passed,
                error = row.error.as_deref().unwrap_or(""),
                "scenario calibrated"
            );
            serde_json::to_writer(&mut writer, &row)?;
            writer.write_all(b"\n")?;
            rows.push(row);
        }
        writer.flush()?;

        report::write_markdown(
            &self.outputs.summary_md,
            &self.config.run_id,
            self.config.inference.tolerance,
            &rows,
        )?;

        let telemetry_path = self
            .logging_enabled
            .then(|| self.outputs.report_dir().join("telemetry.jsonl"));

        Ok(RunSummary {
            scenarios: rows.len(),
            passed: rows.iter().filter(|row| row.passed).count(),
            rows_written: rows.len(),
            seed: self.seed,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    fn evaluate(&self, scenario: &ScenarioConfig) -> ScenarioRow {
        let settings = &self.config.inference;
        let mut row = ScenarioRow {
            run_id: self.config.run_id.clone(),
            scenario: scenario.name.clone(),
            actions: scenario.actions.len(),
            unknown_tiles: 0,
            trials: settings.trials,
            seed: self.seed,
            method: None,
            reference_method: None,
            max_abs_deviation: None,
            mean_abs_deviation: None,
            max_column_error: None,
            max_row_error: None,
            acceptance_ratio: None,
            entropy: None,
            certain_tiles: None,
            passed: false,
            error: None,
        };

        if let Err(err) = self.compare(scenario, &mut row) {
            row.error = Some(err.to_string());
        }
        row
    }

    fn compare(&self, scenario: &ScenarioConfig, row: &mut ScenarioRow) -> Result<(), OracleError> {
        let settings = &self.config.inference;
        let record = GameRecord {
            hand: scenario.hand.clone(),
            actions: scenario.actions.clone(),
        };
        let state = record.restore()?;
        state.verify_consistency();

        let unknown = state.constraints().unknown_tiles().len();
        row.unknown_tiles = unknown;

        let constraints = state.constraints();
        let sampled = marginals(
            constraints,
            &InferenceConfig::sampling(settings.trials, Some(self.seed)),
        )?;
        let reference = marginals(constraints, &self.reference_config(unknown))?;

        let remaining = Player::OPPONENTS.map(|player| constraints.remaining(player));
        let (max_dev, mean_dev) = deviation(&sampled, &reference);
        let column_error = max_column_error(&sampled);
        let row_error = max_row_error(&sampled, remaining);
        let metrics = TableMetrics::from_table(&sampled);

        row.method = Some(sampled.method().to_string());
        row.reference_method = Some(reference.method().to_string());
        row.max_abs_deviation = Some(max_dev);
        row.mean_abs_deviation = Some(mean_dev);
        row.max_column_error = Some(column_error);
        row.max_row_error = Some(row_error);
        row.acceptance_ratio = Some(metrics.acceptance_ratio);
        row.entropy = Some(metrics.entropy_per_opponent);
        row.certain_tiles = Some(metrics.certain_per_opponent);
        row.passed =
            max_dev <= settings.tolerance && column_error < SUM_EPSILON && row_error < SUM_EPSILON;
        Ok(())
    }

    /// Exact enumeration when it fits, otherwise a larger independent sample.
    fn reference_config(&self, unknown: usize) -> InferenceConfig {
        if unknown <= EXACT_CEILING {
            InferenceConfig::exact()
        } else {
            InferenceConfig::sampling(
                self.config.inference.reference_trials,
                Some(self.seed.wrapping_add(1)),
            )
        }
    }
}

/// Max and mean absolute difference over every (opponent, tile) entry.
fn deviation(table: &ProbabilityTable, reference: &ProbabilityTable) -> (f64, f64) {
    let mut max = 0.0_f64;
    let mut total = 0.0;
    let mut entries = 0usize;
    for tile in reference.tiles() {
        for player in Player::OPPONENTS {
            let diff = (table.get(player, *tile) - reference.get(player, *tile)).abs();
            max = max.max(diff);
            total += diff;
            entries += 1;
        }
    }
    let mean = if entries == 0 { 0.0 } else { total / entries as f64 };
    (max, mean)
}

fn max_column_error(table: &ProbabilityTable) -> f64 {
    table
        .tiles()
        .iter()
        .map(|tile| (table.column_sum(*tile) - 1.0).abs())
        .fold(0.0, f64::max)
}

fn max_row_error(table: &ProbabilityTable, remaining: [u8; 3]) -> f64 {
    Player::OPPONENTS
        .into_iter()
        .zip(remaining)
        .map(|(player, count)| (table.row_sum(player) - count as f64).abs())
        .fold(0.0, f64::max)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize scenario row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}
