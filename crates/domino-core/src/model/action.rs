use crate::model::player::Player;
use crate::model::tile::Tile;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A single observed move. Validation happens when the action is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// `player` places `tile` against the open end showing `end`.
    Play { player: Player, tile: Tile, end: u8 },
    Pass { player: Player },
}

impl Action {
    pub const fn play(player: Player, tile: Tile, end: u8) -> Self {
        Action::Play { player, tile, end }
    }

    pub const fn pass(player: Player) -> Self {
        Action::Pass { player }
    }

    pub const fn player(&self) -> Player {
        match self {
            Action::Play { player, .. } | Action::Pass { player } => *player,
        }
    }

    pub const fn is_pass(&self) -> bool {
        matches!(self, Action::Pass { .. })
    }

    pub const fn tile(&self) -> Option<Tile> {
        match self {
            Action::Play { tile, .. } => Some(*tile),
            Action::Pass { .. } => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Play { player, tile, end } => write!(f, "{player} plays {tile} on {end}"),
            Action::Pass { player } => write!(f, "{player} passes"),
        }
    }
}
