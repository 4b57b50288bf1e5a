//! Exact marginals by enumerating every consistent deal of the unknown tiles.
//!
//! Opponents are processed in the fixed order West, North, East. West's hand is
//! drawn as a combination of West's candidates, North's as a combination of the
//! candidates West left behind, and East receives whatever remains, which must
//! lie entirely within East's candidates. The outer loop over West's hands is
//! split across the rayon pool and the per-worker tallies are summed.

use super::table::{ProbabilityTable, Tally};
use super::{EXACT_CEILING, InferenceError, InferenceMethod};
use crate::constraint::ConstraintSet;
use crate::model::player::Player;
use crate::model::tile::Tile;
use crate::model::tile_set::TileSet;
use rayon::prelude::*;
use tracing::{Level, event};

pub fn exact_marginals(constraints: &ConstraintSet) -> Result<ProbabilityTable, InferenceError> {
    let unknown = constraints.unknown_tiles();
    if unknown.len() > EXACT_CEILING {
        return Err(InferenceError::TooManyUnknowns {
            unknown: unknown.len(),
            ceiling: EXACT_CEILING,
        });
    }

    let [west, north, east] =
        Player::OPPONENTS.map(|player| constraints.candidates(player).intersection(unknown));
    let [west_size, north_size, east_size] =
        Player::OPPONENTS.map(|player| constraints.remaining(player) as usize);

    let west_pool = west.to_vec();
    let west_hands: Vec<TileSet> = Combinations::new(&west_pool, west_size).collect();

    let tally = west_hands
        .par_iter()
        .map(|&west_hand| {
            let mut tally = Tally::default();
            let north_pool = north.difference(west_hand).to_vec();
            for north_hand in Combinations::new(&north_pool, north_size) {
                tally.attempted(1);
                let east_hand = unknown.difference(west_hand).difference(north_hand);
                if east_hand.len() == east_size && east_hand.is_subset(east) {
                    tally.record([west_hand, north_hand, east_hand]);
                }
            }
            tally
        })
        .reduce(Tally::default, Tally::merge);

    event!(
        target: "domino_core::inference",
        Level::DEBUG,
        unknown = unknown.len(),
        west_hands = west_hands.len(),
        accepted = tally.accepted(),
        "exact enumeration finished"
    );

    tally.into_table(unknown, InferenceMethod::Exact)
}

/// Lexicographic `k`-subsets of a pool of distinct tiles.
pub(crate) struct Combinations<'a> {
    pool: &'a [Tile],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    pub(crate) fn new(pool: &'a [Tile], k: usize) -> Self {
        Self {
            pool,
            indices: (0..k).collect(),
            done: k > pool.len(),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = TileSet;

    fn next(&mut self) -> Option<TileSet> {
        if self.done {
            return None;
        }
        let current = self.indices.iter().map(|&i| self.pool[i]).collect();

        let n = self.pool.len();
        let k = self.indices.len();
        match (0..k).rev().find(|&i| self.indices[i] < n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::PlayerConstraints;
    use crate::model::tile::catalog;

    fn t(lo: u8, hi: u8) -> Tile {
        Tile::new(lo, hi).unwrap()
    }

    fn set(tiles: &[Tile]) -> TileSet {
        tiles.iter().collect()
    }

    #[test]
    fn combinations_count_matches_binomial() {
        let pool: Vec<Tile> = Tile::ALL[..6].to_vec();
        assert_eq!(Combinations::new(&pool, 3).count(), 20);
        assert_eq!(Combinations::new(&pool, 0).count(), 1);
        assert_eq!(Combinations::new(&pool, 6).count(), 1);
        assert_eq!(Combinations::new(&pool, 7).count(), 0);
        let all: Vec<TileSet> = Combinations::new(&pool, 2).collect();
        assert!(all.iter().all(|c| c.len() == 2));
        assert_eq!(all.first(), Some(&set(&pool[..2])));
        assert_eq!(all.last(), Some(&set(&pool[4..])));
    }

    #[test]
    fn unconstrained_three_tiles_are_uniform() {
        let unknown = set(&[t(0, 0), t(0, 1), t(0, 2)]);
        let hand = catalog().difference(unknown);
        let cs = ConstraintSet::from_parts(
            hand,
            TileSet::EMPTY,
            [PlayerConstraints::new(unknown, 1, []); 3],
        );
        let table = exact_marginals(&cs).unwrap();
        assert_eq!(table.configurations(), 6);
        for tile in unknown {
            for player in Player::OPPONENTS {
                assert!((table.get(player, tile) - 1.0 / 3.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn candidate_restrictions_are_respected() {
        let (a, b, c, d) = (t(0, 0), t(1, 1), t(2, 2), t(3, 3));
        let unknown = set(&[a, b, c, d]);
        let hand = catalog().difference(unknown);
        let cs = ConstraintSet::from_parts(
            hand,
            TileSet::EMPTY,
            [
                PlayerConstraints::new(set(&[a, b]), 1, []),
                PlayerConstraints::new(unknown, 2, []),
                PlayerConstraints::new(set(&[c, d]), 1, []),
            ],
        );
        let table = exact_marginals(&cs).unwrap();
        // West x East choices are 2 x 2; North takes the rest.
        assert_eq!(table.configurations(), 4);
        assert_eq!(table.get(Player::West, c), 0.0);
        assert_eq!(table.get(Player::East, a), 0.0);
        assert!((table.get(Player::West, a) - 0.5).abs() < 1e-12);
        assert!((table.get(Player::North, a) - 0.5).abs() < 1e-12);
        assert!((table.row_sum(Player::North) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn too_many_unknowns_is_rejected() {
        let hand = set(&Tile::ALL[..7]);
        let cs = ConstraintSet::initial(hand).unwrap();
        assert_eq!(
            exact_marginals(&cs).unwrap_err(),
            InferenceError::TooManyUnknowns {
                unknown: 21,
                ceiling: EXACT_CEILING
            }
        );
    }
}
