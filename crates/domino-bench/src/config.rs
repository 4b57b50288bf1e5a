use domino_core::{Action, Tile};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_TRIALS: usize = 10_000;
const DEFAULT_REFERENCE_TRIALS: usize = 200_000;
const DEFAULT_TOLERANCE: f64 = 0.02;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root calibration configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    #[serde(default)]
    pub inference: InferenceSettings,
    pub scenarios: Vec<ScenarioConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.inference.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_scenarios(&self.scenarios)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Estimator settings shared by every scenario.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InferenceSettings {
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Base seed; a fresh one is drawn per run when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Trials for the sampled reference when exact enumeration is out of reach.
    #[serde(default = "default_reference_trials")]
    pub reference_trials: usize,
    /// Largest accepted absolute deviation from the reference.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            reference_trials: DEFAULT_REFERENCE_TRIALS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl InferenceSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.trials == 0 {
            return Err(ValidationError::InvalidField {
                field: "inference.trials".to_string(),
                message: "number of trials must be greater than zero".to_string(),
            });
        }

        if self.reference_trials == 0 {
            return Err(ValidationError::InvalidField {
                field: "inference.reference_trials".to_string(),
                message: "number of reference trials must be greater than zero".to_string(),
            });
        }

        if !(self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(ValidationError::InvalidField {
                field: "inference.tolerance".to_string(),
                message: format!("tolerance must lie in (0, 1], got {}", self.tolerance),
            });
        }

        Ok(())
    }
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_reference_trials() -> usize {
    DEFAULT_REFERENCE_TRIALS
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// A recorded game: South's dealt hand and the actions observed so far.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub hand: Vec<Tile>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_scenarios(scenarios: &[ScenarioConfig]) -> Result<(), ValidationError> {
    if scenarios.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "scenarios".to_string(),
            message: "at least one scenario must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for scenario in scenarios {
        if scenario.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "scenarios.name".to_string(),
                message: "scenario name must not be empty".to_string(),
            });
        }

        if !seen.insert(scenario.name.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "scenarios".to_string(),
                message: format!("scenario name '{}' defined more than once", scenario.name),
            });
        }

        // Hand legality is left to the oracle; only the shape is checked here.
        if scenario.hand.is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("scenarios[{}].hand", scenario.name),
                message: "hand must list South's dealt tiles".to_string(),
            });
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Directory holding the summary; telemetry is written beside it.
    pub fn report_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use domino_core::Player;

    const BASIC_YAML: &str = r#"
run_id: "stage0_smoke"
inference:
  trials: 5000
  seed: 123
scenarios:
  - name: "opening"
    hand: ["0|1", "1|3", "2|5", "3|3", "4|6", "5|5", "6|6"]
    actions:
      - { kind: "play", player: "South", tile: "3|3", end: 3 }
      - { kind: "pass", player: "West" }
  - name: "fresh_deal"
    hand: ["0-0", "1-1", "2-2", "3-3", "4-4", "5-5", "6-6"]
outputs:
  jsonl: "bench/out/{run_id}/scenarios.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.inference.trials, 5000);
        assert_eq!(cfg.inference.reference_trials, DEFAULT_REFERENCE_TRIALS);
        assert_eq!(cfg.inference.tolerance, DEFAULT_TOLERANCE);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let opening = &cfg.scenarios[0];
        assert_eq!(opening.hand[3], Tile::new(3, 3).unwrap());
        assert_eq!(opening.actions[1], Action::pass(Player::West));
        assert!(cfg.scenarios[1].actions.is_empty());

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/stage0_smoke/scenarios.jsonl")
        );
        assert_eq!(outputs.report_dir(), PathBuf::from("bench/out/stage0_smoke"));
    }

    #[test]
    fn rejects_duplicate_scenarios() {
        let yaml = BASIC_YAML.replace("fresh_deal", "opening");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("duplicate scenarios should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "scenarios"
        ));
    }

    #[test]
    fn rejects_zero_tolerance() {
        let yaml = BASIC_YAML.replace("seed: 123", "seed: 123\n  tolerance: 0.0");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("zero tolerance");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "inference.tolerance"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("stage0_smoke", "stage 0 smoke");
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn malformed_tile_fails_to_parse() {
        let yaml = BASIC_YAML.replace("\"6|6\"", "\"6|7\"");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&yaml).is_err());
    }
}
