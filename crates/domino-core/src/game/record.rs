use crate::inference::InferenceConfig;
use crate::model::action::Action;
use crate::model::tile::Tile;
use crate::model::tile_set::TileSet;
use crate::oracle::{self, OracleError, OracleState};
use serde::{Deserialize, Serialize};

/// South's dealt hand and the ordered actions of one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    pub hand: Vec<Tile>,
    pub actions: Vec<Action>,
}

impl GameRecord {
    pub fn capture(state: &OracleState) -> Self {
        state.record()
    }

    pub fn hand_set(&self) -> TileSet {
        self.hand.iter().collect()
    }

    /// Rebuilds the oracle by replaying every action, without computing probabilities.
    pub fn restore(&self) -> Result<OracleState, OracleError> {
        self.actions
            .iter()
            .try_fold(OracleState::initial(self.hand_set())?, |state, action| {
                state.apply_action(*action)
            })
    }

    pub fn replay(&self, config: &InferenceConfig) -> Result<OracleState, OracleError> {
        oracle::replay_with(self.hand_set(), &self.actions, config)
    }

    pub fn to_json(state: &OracleState) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::capture(state))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::GameRecord;
    use crate::inference::InferenceConfig;
    use crate::model::action::Action;
    use crate::model::player::Player;
    use crate::model::tile::Tile;
    use crate::oracle::OracleState;

    fn t(lo: u8, hi: u8) -> Tile {
        Tile::new(lo, hi).unwrap()
    }

    fn state() -> OracleState {
        let hand = [t(0, 1), t(1, 3), t(2, 5), t(3, 3), t(4, 6), t(5, 5), t(6, 6)]
            .into_iter()
            .collect();
        OracleState::initial(hand)
            .unwrap()
            .apply_action(Action::play(Player::South, t(3, 3), 3))
            .unwrap()
            .apply_action(Action::pass(Player::West))
            .unwrap()
    }

    #[test]
    fn record_serializes_to_json() {
        let json = GameRecord::to_json(&state()).unwrap();
        assert!(json.contains("\"[3|3]\""));
        assert!(json.contains("\"kind\": \"pass\""));
        assert!(!json.contains("probabilities"));
    }

    #[test]
    fn restore_rebuilds_the_same_state() {
        let original = state();
        let record = GameRecord::capture(&original);
        assert_eq!(record.restore().unwrap(), original);
    }

    #[test]
    fn from_json_accepts_loose_tile_notation() {
        let json = r#"{
            "hand": ["0-1", "13", "2|5", "[3|3]", "6|4", "5-5", "66"],
            "actions": [
                {"kind": "play", "player": "South", "tile": "3|3", "end": 3},
                {"kind": "pass", "player": "West"}
            ]
        }"#;
        let record = GameRecord::from_json(json).unwrap();
        assert_eq!(record.hand[4], t(4, 6));
        let replayed = record.replay(&InferenceConfig::sampling(200, Some(1))).unwrap();
        assert_eq!(replayed.game(), state().game());
        assert!(replayed.probabilities().is_some());
    }
}
