#![deny(warnings)]
pub mod constraint;
pub mod game;
pub mod inference;
pub mod model;
pub mod oracle;

pub use constraint::{ConstraintSet, PlayerConstraints};
pub use game::GameRecord;
pub use inference::{InferenceConfig, InferenceError, InferenceMethod, ProbabilityTable};
pub use model::action::Action;
pub use model::game_state::{GameError, GameState, OpenEnds};
pub use model::player::{Player, Team};
pub use model::tile::{Tile, TileError};
pub use model::tile_set::TileSet;
pub use oracle::{OracleError, OracleState, replay, replay_with};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "domino-oracle"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "domino-oracle");
        assert!(!AppInfo::version().is_empty());
    }
}
