use super::{InferenceMethod, ProbabilityTable};
use crate::model::player::Player;
use serde::Serialize;

/// Probabilities within this distance of 0 or 1 count as certain.
const CERTAINTY_EPSILON: f64 = 1e-9;

/// Summary of how much is still unknown about each hidden hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetrics {
    pub method: InferenceMethod,
    pub unknown_tiles: usize,
    /// Sum of binary entropies (nats) of each opponent's row.
    pub entropy_per_opponent: [f64; 3],
    /// Tiles each opponent holds with probability 1.
    pub certain_per_opponent: [usize; 3],
    pub acceptance_ratio: f64,
}

impl TableMetrics {
    pub fn from_table(table: &ProbabilityTable) -> Self {
        let mut entropy_per_opponent = [0.0; 3];
        let mut certain_per_opponent = [0; 3];

        for (slot, player) in Player::OPPONENTS.into_iter().enumerate() {
            for (_, prob) in table.row(player) {
                entropy_per_opponent[slot] += binary_entropy(prob);
                if prob >= 1.0 - CERTAINTY_EPSILON {
                    certain_per_opponent[slot] += 1;
                }
            }
        }

        Self {
            method: table.method(),
            unknown_tiles: table.tiles().len(),
            entropy_per_opponent,
            certain_per_opponent,
            acceptance_ratio: table.acceptance_ratio(),
        }
    }

    pub fn total_entropy(&self) -> f64 {
        self.entropy_per_opponent.iter().sum()
    }
}

fn binary_entropy(p: f64) -> f64 {
    if p <= CERTAINTY_EPSILON || p >= 1.0 - CERTAINTY_EPSILON {
        return 0.0;
    }
    -(p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}
