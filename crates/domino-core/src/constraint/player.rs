use crate::model::tile::{MAX_PIP, Tile, suit_union};
use crate::model::tile_set::TileSet;
use serde::{Deserialize, Serialize};

/// What is known about one hidden hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerConstraints {
    candidates: TileSet,
    remaining: u8,
    eliminated: u8,
}

impl PlayerConstraints {
    pub fn new(candidates: TileSet, remaining: u8, eliminated: impl IntoIterator<Item = u8>) -> Self {
        let eliminated = eliminated
            .into_iter()
            .filter(|value| *value <= MAX_PIP)
            .fold(0u8, |mask, value| mask | (1 << value));
        Self {
            candidates,
            remaining,
            eliminated,
        }
    }

    /// Tiles this player could still hold.
    pub fn candidates(&self) -> TileSet {
        self.candidates
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Pip values this player is known not to hold, ascending.
    pub fn eliminated_values(&self) -> Vec<u8> {
        (0..=MAX_PIP).filter(|value| self.is_eliminated(*value)).collect()
    }

    pub fn is_eliminated(&self, value: u8) -> bool {
        value <= MAX_PIP && self.eliminated & (1 << value) != 0
    }

    /// Candidate count equals hand size, so the hand is fully known.
    pub fn is_determined(&self) -> bool {
        self.candidates.len() == self.remaining as usize
    }

    pub(crate) fn without_tile(self, tile: Tile) -> Self {
        Self {
            candidates: self.candidates.without(tile),
            ..self
        }
    }

    pub(crate) fn without_tiles(self, tiles: TileSet) -> Self {
        Self {
            candidates: self.candidates.difference(tiles),
            ..self
        }
    }

    pub(crate) fn decremented(self) -> Self {
        Self {
            remaining: self.remaining.saturating_sub(1),
            ..self
        }
    }

    /// Records that no tile carrying `value` is held.
    pub(crate) fn eliminate_value(self, value: u8) -> Self {
        if value > MAX_PIP {
            return self;
        }
        Self {
            candidates: self.candidates.difference(suit_union([value])),
            eliminated: self.eliminated | (1 << value),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerConstraints;
    use crate::model::tile::{Tile, suit};
    use crate::model::tile_set::TileSet;

    #[test]
    fn eliminating_a_value_drops_its_suit() {
        let pc = PlayerConstraints::new(TileSet::FULL, 7, []).eliminate_value(4);
        assert_eq!(pc.candidates().len(), 21);
        assert!(pc.candidates().is_disjoint(suit(4).unwrap()));
        assert!(pc.is_eliminated(4));
        assert_eq!(pc.eliminated_values(), vec![4]);
    }

    #[test]
    fn determined_when_counts_match() {
        let tile = Tile::new(0, 0).unwrap();
        let pc = PlayerConstraints::new([tile].into_iter().collect(), 1, [2, 5]);
        assert!(pc.is_determined());
        assert_eq!(pc.eliminated_values(), vec![2, 5]);
        let pc = pc.without_tile(tile);
        assert!(!pc.is_determined());
        assert_eq!(pc.decremented().remaining(), 0);
        assert!(pc.decremented().is_determined());
    }
}
