//! Immutable turn-by-turn game state for 2v2 double-six dominoes.

use crate::model::action::Action;
use crate::model::player::{Player, Team};
use crate::model::tile::{Tile, catalog};
use crate::model::tile_set::TileSet;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HAND_SIZE: usize = 7;

/// Consecutive passes that lock the board.
const LOCK_PASSES: usize = 4;

/// The two exposed pip values of the chain. Both may be equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpenEnds {
    pub left: u8,
    pub right: u8,
}

impl OpenEnds {
    pub const fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    pub const fn contains(self, value: u8) -> bool {
        self.left == value || self.right == value
    }

    /// Distinct open values; a single entry when both ends match.
    pub fn values(self) -> impl Iterator<Item = u8> {
        let right = (self.right != self.left).then_some(self.right);
        core::iter::once(self.left).chain(right)
    }
}

impl fmt::Display for OpenEnds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid hand: {reason}")]
    InvalidHand { reason: String },
    #[error("it is {expected}'s turn, not {actual}'s")]
    WrongTurn { expected: Player, actual: Player },
    #[error("tile {tile} does not contain the declared end value {end}")]
    TileMismatch { tile: Tile, end: u8 },
    #[error("tile {0} has already been played")]
    AlreadyPlayed(Tile),
    #[error("end value {end} does not match either open end {open}")]
    IllegalEnd { end: u8, open: OpenEnds },
    #[error("cannot pass before the first tile is played")]
    CannotPassFirst,
    #[error("the game is already over")]
    GameOver,
    #[error("South does not hold {0}")]
    NotInHand(Tile),
    #[error("{player} cannot play {tile}: it is in South's hand")]
    HeldByObserver { player: Player, tile: Tile },
}

/// Validates an observer hand of exactly seven catalog tiles.
pub(crate) fn validate_hand(hand: TileSet) -> Result<(), GameError> {
    if hand.len() != HAND_SIZE {
        return Err(GameError::InvalidHand {
            reason: format!("expected {HAND_SIZE} distinct tiles, got {}", hand.len()),
        });
    }
    if !hand.is_subset(catalog()) {
        return Err(GameError::InvalidHand {
            reason: "hand contains tiles outside the double-six set".to_string(),
        });
    }
    Ok(())
}

/// Snapshot of a game in progress. Every transition returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    hand: TileSet,
    history: Vec<Action>,
    open_ends: Option<OpenEnds>,
    played: TileSet,
    current: Player,
    remaining: [u8; 4],
}

impl GameState {
    pub fn initial(hand: TileSet) -> Result<Self, GameError> {
        validate_hand(hand)?;
        Ok(Self {
            hand,
            history: Vec::new(),
            open_ends: None,
            played: TileSet::EMPTY,
            current: Player::OBSERVER,
            remaining: [HAND_SIZE as u8; 4],
        })
    }

    pub fn all_tiles(&self) -> TileSet {
        catalog()
    }

    /// South's current hand.
    pub fn hand(&self) -> TileSet {
        self.hand
    }

    pub fn history(&self) -> &[Action] {
        &self.history
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.history.last()
    }

    pub fn open_ends(&self) -> Option<OpenEnds> {
        self.open_ends
    }

    pub fn open_end_values(&self) -> Vec<u8> {
        self.open_ends
            .map(|ends| ends.values().collect())
            .unwrap_or_default()
    }

    pub fn played(&self) -> TileSet {
        self.played
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn remaining(&self, player: Player) -> u8 {
        self.remaining[player.index()]
    }

    pub fn remaining_counts(&self) -> [u8; 4] {
        self.remaining
    }

    pub fn team_of(player: Player) -> Team {
        player.team()
    }

    /// Tiles held by one of the three hidden hands.
    pub fn unknown_tiles(&self) -> TileSet {
        catalog().difference(self.hand).difference(self.played)
    }

    /// True once a seat has emptied its hand or four passes in a row lock the board.
    pub fn is_game_over(&self) -> bool {
        if self.remaining.contains(&0) {
            return true;
        }
        self.history.len() >= LOCK_PASSES
            && self.history[self.history.len() - LOCK_PASSES..]
                .iter()
                .all(Action::is_pass)
    }

    pub fn apply_action(&self, action: Action) -> Result<Self, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let actual = action.player();
        if actual != self.current {
            return Err(GameError::WrongTurn {
                expected: self.current,
                actual,
            });
        }

        match action {
            Action::Play { player, tile, end } => self.apply_play(player, tile, end, action),
            Action::Pass { .. } => self.apply_pass(action),
        }
    }

    fn apply_play(
        &self,
        player: Player,
        tile: Tile,
        end: u8,
        action: Action,
    ) -> Result<Self, GameError> {
        if !tile.contains(end) {
            return Err(GameError::TileMismatch { tile, end });
        }
        if self.played.contains(tile) {
            return Err(GameError::AlreadyPlayed(tile));
        }
        if player.is_observer() && !self.hand.contains(tile) {
            return Err(GameError::NotInHand(tile));
        }
        if !player.is_observer() && self.hand.contains(tile) {
            return Err(GameError::HeldByObserver { player, tile });
        }

        let open_ends = match (self.open_ends, tile.other(end)) {
            (None, _) => OpenEnds::new(tile.lo(), tile.hi()),
            (Some(open), Some(exposed)) if open.left == end => OpenEnds::new(exposed, open.right),
            (Some(open), Some(exposed)) if open.right == end => OpenEnds::new(open.left, exposed),
            (Some(open), _) => return Err(GameError::IllegalEnd { end, open }),
        };

        let mut remaining = self.remaining;
        remaining[player.index()] -= 1;

        let mut history = self.history.clone();
        history.push(action);

        Ok(Self {
            hand: self.hand.without(tile),
            history,
            open_ends: Some(open_ends),
            played: self.played.with(tile),
            current: self.current.next(),
            remaining,
        })
    }

    fn apply_pass(&self, action: Action) -> Result<Self, GameError> {
        if self.open_ends.is_none() {
            return Err(GameError::CannotPassFirst);
        }

        let mut history = self.history.clone();
        history.push(action);

        Ok(Self {
            history,
            current: self.current.next(),
            ..self.clone()
        })
    }
}
