//! Rejection sampling over random deals of the unknown tiles.

use super::table::{ProbabilityTable, Tally};
use super::{InferenceError, InferenceMethod};
use crate::constraint::ConstraintSet;
use crate::model::player::Player;
use crate::model::tile::Tile;
use crate::model::tile_set::TileSet;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{Level, event};

/// Trials per independently seeded chunk. Fixed so results do not depend on
/// how rayon schedules the chunks.
const CHUNK_TRIALS: usize = 1024;

/// Estimates marginals from `trials` shuffled deals, keeping only deals in
/// which every opponent receives candidate tiles.
///
/// The table is normalized by the number of accepted deals. With a seed the
/// output is bit-identical across runs and thread counts.
pub fn sample_marginals(
    constraints: &ConstraintSet,
    trials: usize,
    seed: Option<u64>,
) -> Result<ProbabilityTable, InferenceError> {
    let unknown = constraints.unknown_tiles();
    let candidates = Player::OPPONENTS.map(|player| constraints.candidates(player));
    let sizes = Player::OPPONENTS.map(|player| constraints.remaining(player) as usize);
    let base_seed = seed.unwrap_or_else(rand::random);
    let pool = unknown.to_vec();

    let tally = if sizes.iter().sum::<usize>() != pool.len() {
        // Hand sizes cannot cover the unknown tiles; every deal is rejected.
        let mut tally = Tally::default();
        tally.attempted(trials as u64);
        tally
    } else {
        let chunks = trials.div_ceil(CHUNK_TRIALS);
        (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let len = CHUNK_TRIALS.min(trials - chunk * CHUNK_TRIALS);
                let mut rng = SmallRng::seed_from_u64(chunk_seed(base_seed, chunk as u64));
                sample_chunk(pool.clone(), &candidates, &sizes, len, &mut rng)
            })
            .reduce(Tally::default, Tally::merge)
    };

    event!(
        target: "domino_core::inference",
        Level::DEBUG,
        unknown = unknown.len(),
        trials,
        accepted = tally.accepted(),
        seed = base_seed,
        "rejection sampling finished"
    );

    tally.into_table(unknown, InferenceMethod::Sampling)
}

fn sample_chunk(
    mut pool: Vec<Tile>,
    candidates: &[TileSet; 3],
    sizes: &[usize; 3],
    trials: usize,
    rng: &mut SmallRng,
) -> Tally {
    let mut tally = Tally::default();
    tally.attempted(trials as u64);
    for _ in 0..trials {
        pool.shuffle(rng);
        if let Some(hands) = deal(&pool, candidates, sizes) {
            tally.record(hands);
        }
    }
    tally
}

/// Slices a permutation into hands, rejecting any tile outside its recipient's candidates.
fn deal(permutation: &[Tile], candidates: &[TileSet; 3], sizes: &[usize; 3]) -> Option<[TileSet; 3]> {
    let mut hands = [TileSet::EMPTY; 3];
    let mut offset = 0;
    for slot in 0..3 {
        let hand: TileSet = permutation[offset..offset + sizes[slot]].iter().collect();
        if !hand.is_subset(candidates[slot]) {
            return None;
        }
        hands[slot] = hand;
        offset += sizes[slot];
    }
    Some(hands)
}

/// SplitMix64 over the base seed and chunk index.
fn chunk_seed(base: u64, chunk: u64) -> u64 {
    let mut z = base.wrapping_add(chunk.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
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

    fn opening() -> ConstraintSet {
        let hand = set(&[t(0, 1), t(1, 3), t(2, 5), t(3, 3), t(4, 6), t(5, 5), t(6, 6)]);
        ConstraintSet::initial(hand).unwrap()
    }

    #[test]
    fn deterministic_with_fixed_seed() {
        let cs = opening();
        let a = sample_marginals(&cs, 5_000, Some(123)).unwrap();
        let b = sample_marginals(&cs, 5_000, Some(123)).unwrap();
        assert_eq!(a, b);
        let c = sample_marginals(&cs, 5_000, Some(124)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn unconstrained_deals_are_always_accepted() {
        let table = sample_marginals(&opening(), 3_000, Some(9)).unwrap();
        assert_eq!(table.attempts(), 3_000);
        assert_eq!(table.configurations(), 3_000);
        assert_eq!(table.method(), InferenceMethod::Sampling);
        for tile in table.tiles() {
            assert!((table.column_sum(*tile) - 1.0).abs() < 1e-9);
        }
        for player in Player::OPPONENTS {
            assert!((table.row_sum(player) - 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn deal_rejects_foreign_tiles() {
        let (a, b, c) = (t(0, 0), t(1, 1), t(2, 2));
        let candidates = [set(&[a]), set(&[b, c]), set(&[a, b, c])];
        assert_eq!(
            deal(&[a, b, c], &candidates, &[1, 1, 1]),
            Some([set(&[a]), set(&[b]), set(&[c])])
        );
        assert_eq!(deal(&[b, a, c], &candidates, &[1, 1, 1]), None);
    }

    #[test]
    fn mismatched_hand_sizes_reject_everything() {
        let unknown = set(&[t(0, 0), t(1, 1)]);
        let cs = ConstraintSet::from_parts(
            catalog().difference(unknown),
            TileSet::EMPTY,
            [PlayerConstraints::new(unknown, 1, []); 3],
        );
        let err = sample_marginals(&cs, 100, Some(1)).unwrap_err();
        assert_eq!(
            err,
            InferenceError::NoValidConfiguration {
                method: InferenceMethod::Sampling,
                attempts: 100
            }
        );
    }

    #[test]
    fn chunk_seeds_differ() {
        assert_ne!(chunk_seed(7, 0), chunk_seed(7, 1));
        assert_ne!(chunk_seed(7, 0), chunk_seed(8, 0));
    }
}
