use super::{InferenceError, InferenceMethod};
use crate::model::player::Player;
use crate::model::tile::{TILE_COUNT, Tile};
use crate::model::tile_set::TileSet;
use serde::Serialize;

/// Marginal probabilities P(opponent holds tile) over the current unknown tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityTable {
    tiles: Vec<Tile>,
    /// One row per opponent in [`Player::OPPONENTS`] order, aligned with `tiles`.
    probs: [Vec<f64>; 3],
    method: InferenceMethod,
    configurations: u64,
    attempts: u64,
}

impl ProbabilityTable {
    /// Unknown tiles covered by the table, ascending.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Estimator that produced the table (never `Auto`).
    pub fn method(&self) -> InferenceMethod {
        self.method
    }

    /// Accepted partitions (exact) or accepted trials (sampling).
    pub fn configurations(&self) -> u64 {
        self.configurations
    }

    /// Configurations examined; equals the trial count for sampling.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.configurations as f64 / self.attempts as f64
        }
    }

    /// P(`player` holds `tile`); zero for South and for tiles outside the table.
    pub fn get(&self, player: Player, tile: Tile) -> f64 {
        match (player.opponent_slot(), self.position(tile)) {
            (Some(slot), Some(col)) => self.probs[slot][col],
            _ => 0.0,
        }
    }

    pub fn row(&self, player: Player) -> Vec<(Tile, f64)> {
        let Some(slot) = player.opponent_slot() else {
            return Vec::new();
        };
        self.tiles
            .iter()
            .copied()
            .zip(self.probs[slot].iter().copied())
            .collect()
    }

    /// Probabilities for `tile` in [`Player::OPPONENTS`] order.
    pub fn column(&self, tile: Tile) -> Option<[f64; 3]> {
        let col = self.position(tile)?;
        Some([self.probs[0][col], self.probs[1][col], self.probs[2][col]])
    }

    /// Expected hand size of `player` under the table.
    pub fn row_sum(&self, player: Player) -> f64 {
        player
            .opponent_slot()
            .map(|slot| self.probs[slot].iter().sum())
            .unwrap_or(0.0)
    }

    pub fn column_sum(&self, tile: Tile) -> f64 {
        self.column(tile).map(|col| col.iter().sum()).unwrap_or(0.0)
    }

    /// Largest absolute difference against another table over the same tiles.
    pub fn max_abs_diff(&self, other: &ProbabilityTable) -> Option<f64> {
        if self.tiles != other.tiles {
            return None;
        }
        let diff = self
            .probs
            .iter()
            .zip(other.probs.iter())
            .flat_map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()))
            .fold(0.0_f64, f64::max);
        Some(diff)
    }

    fn position(&self, tile: Tile) -> Option<usize> {
        self.tiles.binary_search(&tile).ok()
    }
}

/// Per-(opponent, tile) hit counts merged additively across workers.
#[derive(Debug, Clone)]
pub(crate) struct Tally {
    counts: [[u64; TILE_COUNT]; 3],
    accepted: u64,
    attempts: u64,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            counts: [[0; TILE_COUNT]; 3],
            accepted: 0,
            attempts: 0,
        }
    }
}

impl Tally {
    pub(crate) fn record(&mut self, hands: [TileSet; 3]) {
        for (slot, hand) in hands.iter().enumerate() {
            for tile in hand.iter() {
                self.counts[slot][tile.index()] += 1;
            }
        }
        self.accepted += 1;
    }

    pub(crate) fn attempted(&mut self, count: u64) {
        self.attempts += count;
    }

    pub(crate) fn accepted(&self) -> u64 {
        self.accepted
    }

    pub(crate) fn merge(mut self, other: Tally) -> Tally {
        for (row, other_row) in self.counts.iter_mut().zip(other.counts.iter()) {
            for (count, other_count) in row.iter_mut().zip(other_row.iter()) {
                *count += other_count;
            }
        }
        self.accepted += other.accepted;
        self.attempts += other.attempts;
        self
    }

    /// Normalizes by the accepted count; fails when nothing was accepted.
    pub(crate) fn into_table(
        self,
        unknown: TileSet,
        method: InferenceMethod,
    ) -> Result<ProbabilityTable, InferenceError> {
        if self.accepted == 0 {
            return Err(InferenceError::NoValidConfiguration {
                method,
                attempts: self.attempts,
            });
        }
        let tiles = unknown.to_vec();
        let total = self.accepted as f64;
        let probs = self.counts.map(|row| {
            tiles
                .iter()
                .map(|tile| row[tile.index()] as f64 / total)
                .collect::<Vec<_>>()
        });
        Ok(ProbabilityTable {
            tiles,
            probs,
            method,
            configurations: self.accepted,
            attempts: self.attempts,
        })
    }
}
