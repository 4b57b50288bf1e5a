use super::{DEFAULT_TRIALS, InferenceMethod};
use serde::{Deserialize, Serialize};

/// Estimator selection for a probability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub method: InferenceMethod,
    /// Sampling trials; ignored by exact enumeration.
    pub trials: usize,
    /// Fixed base seed for reproducible sampling. `None` draws a fresh one.
    pub seed: Option<u64>,
}

impl InferenceConfig {
    pub fn sampling(trials: usize, seed: Option<u64>) -> Self {
        Self {
            method: InferenceMethod::Sampling,
            trials,
            seed,
        }
    }

    pub fn exact() -> Self {
        Self {
            method: InferenceMethod::Exact,
            ..Self::default()
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            method: InferenceMethod::Auto,
            trials: DEFAULT_TRIALS,
            seed: None,
        }
    }
}
