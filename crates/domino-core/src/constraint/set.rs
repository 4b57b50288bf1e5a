use super::PlayerConstraints;
use crate::model::game_state::{GameError, HAND_SIZE, OpenEnds, validate_hand};
use crate::model::player::Player;
use crate::model::tile::{Tile, catalog};
use crate::model::tile_set::TileSet;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

/// Safety bound on propagation rounds; every round only shrinks finite sets.
pub const MAX_PROPAGATION_ROUNDS: usize = 50;

/// Constraint snapshot for the three hidden hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    players: [PlayerConstraints; 3],
    played: TileSet,
    hand: TileSet,
}

impl ConstraintSet {
    /// Every opponent may hold any tile South was not dealt.
    pub fn initial(hand: TileSet) -> Result<Self, GameError> {
        validate_hand(hand)?;
        let unknown = catalog().difference(hand);
        let fresh = PlayerConstraints::new(unknown, HAND_SIZE as u8, []);
        Ok(Self {
            players: [fresh; 3],
            played: TileSet::EMPTY,
            hand,
        })
    }

    /// Assembles an arbitrary snapshot, slots ordered as [`Player::OPPONENTS`].
    ///
    /// No propagation is run; call [`ConstraintSet::propagate`] to tighten it.
    pub fn from_parts(hand: TileSet, played: TileSet, players: [PlayerConstraints; 3]) -> Self {
        Self {
            players,
            played,
            hand,
        }
    }

    /// Constraints for `player`, `None` for South.
    pub fn get(&self, player: Player) -> Option<&PlayerConstraints> {
        player.opponent_slot().map(|slot| &self.players[slot])
    }

    /// Candidate tiles for `player`; South has none tracked.
    pub fn candidates(&self, player: Player) -> TileSet {
        self.get(player)
            .map(PlayerConstraints::candidates)
            .unwrap_or(TileSet::EMPTY)
    }

    pub fn remaining(&self, player: Player) -> u8 {
        self.get(player).map(PlayerConstraints::remaining).unwrap_or(0)
    }

    /// Per-opponent constraints in [`Player::OPPONENTS`] order.
    pub fn players(&self) -> &[PlayerConstraints; 3] {
        &self.players
    }

    pub fn played(&self) -> TileSet {
        self.played
    }

    pub fn hand(&self) -> TileSet {
        self.hand
    }

    pub fn unknown_tiles(&self) -> TileSet {
        catalog().difference(self.played).difference(self.hand)
    }

    /// Opponents that may still hold `tile`.
    pub fn holders(&self, tile: Tile) -> Vec<Player> {
        Player::OPPONENTS
            .into_iter()
            .filter(|player| self.candidates(*player).contains(tile))
            .collect()
    }

    /// Unknown tiles no opponent can hold. Non-empty means the snapshot is contradictory.
    pub fn orphaned_tiles(&self) -> TileSet {
        let covered = self
            .players
            .iter()
            .fold(TileSet::EMPTY, |acc, pc| acc.union(pc.candidates()));
        self.unknown_tiles().difference(covered)
    }

    pub fn apply_play(&self, player: Player, tile: Tile) -> Self {
        let mut players = self.players.map(|pc| pc.without_tile(tile));
        if let Some(slot) = player.opponent_slot() {
            players[slot] = players[slot].decremented();
        }
        let hand = if player.is_observer() {
            self.hand.without(tile)
        } else {
            self.hand
        };

        Self {
            players,
            played: self.played.with(tile),
            hand,
        }
        .propagate()
    }

    /// `player` could not follow either open end. South's hand is known, so a
    /// pass by South leaves the constraints untouched.
    pub fn apply_pass(&self, player: Player, open_ends: OpenEnds) -> Self {
        let Some(slot) = player.opponent_slot() else {
            return self.clone();
        };
        let mut players = self.players;
        players[slot] = open_ends
            .values()
            .fold(players[slot], PlayerConstraints::eliminate_value);

        event!(
            target: "domino_core::constraint",
            Level::TRACE,
            player = %player,
            open_ends = %open_ends,
            candidates = players[slot].candidates().len(),
            "pass eliminated open values"
        );

        Self { players, ..*self }.propagate()
    }

    /// Runs the determined-player rule to a fixed point.
    ///
    /// When an opponent's candidate count equals their hand size, those tiles
    /// are theirs and leave every other candidate set. A tile left with a single
    /// holder needs no separate step: that is already expressed by the sets.
    pub fn propagate(&self) -> Self {
        let mut players = self.players;
        let mut rounds = 0;

        while rounds < MAX_PROPAGATION_ROUNDS {
            rounds += 1;
            let mut changed = false;

            for slot in 0..players.len() {
                if !players[slot].is_determined() {
                    continue;
                }
                let locked = players[slot].candidates();
                for other in 0..players.len() {
                    if other == slot {
                        continue;
                    }
                    let narrowed = players[other].without_tiles(locked);
                    if narrowed != players[other] {
                        players[other] = narrowed;
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        if tracing::enabled!(target: "domino_core::constraint", Level::DEBUG) {
            let orphaned = Self { players, ..*self }.orphaned_tiles();
            event!(
                target: "domino_core::constraint",
                Level::DEBUG,
                rounds,
                west = players[0].candidates().len(),
                north = players[1].candidates().len(),
                east = players[2].candidates().len(),
                orphaned = orphaned.len(),
                "propagation settled"
            );
        }

        Self { players, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tile::suit;

    fn t(lo: u8, hi: u8) -> Tile {
        Tile::new(lo, hi).unwrap()
    }

    fn set(tiles: &[Tile]) -> TileSet {
        tiles.iter().collect()
    }

    fn sample_hand() -> TileSet {
        set(&[t(0, 1), t(1, 3), t(2, 5), t(3, 3), t(4, 6), t(5, 5), t(6, 6)])
    }

    #[test]
    fn initial_candidates_exclude_hand() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        for player in Player::OPPONENTS {
            let pc = cs.get(player).unwrap();
            assert_eq!(pc.candidates(), catalog().difference(sample_hand()));
            assert_eq!(pc.remaining(), 7);
            assert!(pc.eliminated_values().is_empty());
        }
        assert!(cs.get(Player::South).is_none());
        assert_eq!(cs.unknown_tiles().len(), 21);
        assert!(cs.orphaned_tiles().is_empty());
    }

    #[test]
    fn initial_validates_hand() {
        assert!(ConstraintSet::initial(set(&[t(0, 0)])).is_err());
    }

    #[test]
    fn play_by_opponent_updates_counts() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        let next = cs.apply_play(Player::North, t(3, 6));
        assert_eq!(next.remaining(Player::North), 6);
        assert_eq!(next.remaining(Player::West), 7);
        assert!(next.played().contains(t(3, 6)));
        for player in Player::OPPONENTS {
            assert!(!next.candidates(player).contains(t(3, 6)));
        }
        assert_eq!(next.hand(), sample_hand());
        assert_eq!(cs.remaining(Player::North), 7);
    }

    #[test]
    fn play_by_observer_shrinks_hand_copy() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        let next = cs.apply_play(Player::South, t(3, 3));
        assert!(!next.hand().contains(t(3, 3)));
        let total: u32 = Player::OPPONENTS
            .iter()
            .map(|p| next.remaining(*p) as u32)
            .sum();
        assert_eq!(total, 21);
        assert_eq!(next.unknown_tiles().len(), 21);
    }

    #[test]
    fn pass_eliminates_both_open_values() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        let next = cs.apply_pass(Player::East, OpenEnds::new(2, 4));
        let east = next.get(Player::East).unwrap();
        assert_eq!(east.eliminated_values(), vec![2, 4]);
        assert!(east.candidates().is_disjoint(suit(2).unwrap()));
        assert!(east.candidates().is_disjoint(suit(4).unwrap()));
        assert_eq!(next.candidates(Player::West), cs.candidates(Player::West));
    }

    #[test]
    fn pass_on_double_records_single_value() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        let next = cs.apply_pass(Player::West, OpenEnds::new(3, 3));
        assert_eq!(next.get(Player::West).unwrap().eliminated_values(), vec![3]);
    }

    #[test]
    fn observer_pass_is_a_no_op() {
        let cs = ConstraintSet::initial(sample_hand()).unwrap();
        assert_eq!(cs.apply_pass(Player::South, OpenEnds::new(1, 2)), cs);
    }

    #[test]
    fn determined_chain_resolves_fully() {
        let (a, b, c) = (t(0, 0), t(1, 1), t(2, 2));
        let unknown = set(&[a, b, c]);
        let hand = catalog().difference(unknown);
        let cs = ConstraintSet::from_parts(
            hand,
            TileSet::EMPTY,
            [
                PlayerConstraints::new(set(&[a]), 1, []),
                PlayerConstraints::new(set(&[a, b]), 1, []),
                PlayerConstraints::new(set(&[a, b, c]), 1, []),
            ],
        )
        .propagate();
        assert_eq!(cs.candidates(Player::West), set(&[a]));
        assert_eq!(cs.candidates(Player::North), set(&[b]));
        assert_eq!(cs.candidates(Player::East), set(&[c]));
        assert_eq!(cs.holders(b), vec![Player::North]);
    }

    #[test]
    fn contradiction_surfaces_as_orphans() {
        let (a, b) = (t(0, 0), t(1, 1));
        let hand = catalog().difference(set(&[a, b]));
        let cs = ConstraintSet::from_parts(
            hand,
            TileSet::EMPTY,
            [
                PlayerConstraints::new(set(&[a]), 1, []),
                PlayerConstraints::new(set(&[a]), 1, []),
                PlayerConstraints::new(TileSet::EMPTY, 0, []),
            ],
        )
        .propagate();
        assert!(cs.orphaned_tiles().contains(b));
    }

    #[test]
    fn candidates_stay_within_unknown() {
        let cs = ConstraintSet::initial(sample_hand())
            .unwrap()
            .apply_play(Player::South, t(3, 3))
            .apply_pass(Player::West, OpenEnds::new(3, 3))
            .apply_play(Player::North, t(3, 6))
            .apply_play(Player::East, t(2, 6));
        for player in Player::OPPONENTS {
            assert!(cs.candidates(player).is_subset(cs.unknown_tiles()));
        }
        assert_eq!(cs.unknown_tiles().len(), 19);
    }
}
