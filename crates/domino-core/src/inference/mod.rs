//! Marginal probabilities for the hidden hands.
//!
//! This module is composed of:
//! - `table`: the [`ProbabilityTable`] result type and the mergeable tally behind it.
//! - `exact`: full enumeration of consistent deals for small residual uncertainty.
//! - `sampler`: seeded rejection sampling over shuffled deals.
//! - `config`: method selection, trial count and seed.
//! - `telemetry`: entropy and certainty summaries of a finished table.

mod config;
mod exact;
mod sampler;
mod table;
pub mod telemetry;

pub use config::InferenceConfig;
pub use exact::exact_marginals;
pub use sampler::sample_marginals;
pub use table::ProbabilityTable;

use crate::constraint::ConstraintSet;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

/// `Auto` picks exact enumeration at or below this many unknown tiles.
pub const EXACT_THRESHOLD: usize = 15;

/// Exact enumeration refuses to run above this many unknown tiles.
pub const EXACT_CEILING: usize = 18;

pub const DEFAULT_TRIALS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMethod {
    #[default]
    Auto,
    Exact,
    Sampling,
}

impl InferenceMethod {
    /// Concrete method `Auto` resolves to for the given number of unknown tiles.
    pub const fn resolve(self, unknown: usize) -> InferenceMethod {
        match self {
            InferenceMethod::Auto if unknown <= EXACT_THRESHOLD => InferenceMethod::Exact,
            InferenceMethod::Auto => InferenceMethod::Sampling,
            other => other,
        }
    }
}

impl fmt::Display for InferenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceMethod::Auto => "auto",
            InferenceMethod::Exact => "exact",
            InferenceMethod::Sampling => "sampling",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("{unknown} unknown tiles exceed the exact enumeration ceiling of {ceiling}")]
    TooManyUnknowns { unknown: usize, ceiling: usize },
    #[error("{method} inference found no consistent deal after {attempts} attempts")]
    NoValidConfiguration { method: InferenceMethod, attempts: u64 },
}

/// Runs the estimator selected by `config` against `constraints`.
pub fn marginals(
    constraints: &ConstraintSet,
    config: &InferenceConfig,
) -> Result<ProbabilityTable, InferenceError> {
    let unknown = constraints.unknown_tiles().len();
    let method = config.method.resolve(unknown);

    event!(
        target: "domino_core::inference",
        Level::DEBUG,
        unknown,
        requested = %config.method,
        method = %method,
        trials = config.trials,
        "running inference"
    );

    match method {
        InferenceMethod::Exact => exact_marginals(constraints),
        _ => sample_marginals(constraints, config.trials, config.seed),
    }
}
