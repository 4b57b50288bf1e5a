//! Game state, constraints and probabilities kept in lockstep.

use crate::constraint::ConstraintSet;
use crate::game::record::GameRecord;
use crate::inference::{self, InferenceConfig, InferenceError, InferenceMethod, ProbabilityTable};
use crate::model::action::Action;
use crate::model::game_state::{GameError, GameState};
use crate::model::player::Player;
use crate::model::tile::Tile;
use crate::model::tile_set::TileSet;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// One consistent view of the table from South's seat.
///
/// Every action produces a new value with the probability table cleared;
/// a fresh table is computed on request.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleState {
    game: GameState,
    constraints: ConstraintSet,
    probabilities: Option<ProbabilityTable>,
}

impl OracleState {
    pub fn initial(hand: TileSet) -> Result<Self, OracleError> {
        Ok(Self {
            game: GameState::initial(hand)?,
            constraints: ConstraintSet::initial(hand)?,
            probabilities: None,
        })
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Latest table, `None` when an action has been applied since it was computed.
    pub fn probabilities(&self) -> Option<&ProbabilityTable> {
        self.probabilities.as_ref()
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    pub fn apply_action(&self, action: Action) -> Result<Self, OracleError> {
        let game = self.game.apply_action(action).inspect_err(|err| {
            event!(
                target: "domino_core::oracle",
                Level::DEBUG,
                action = %action,
                error = %err,
                "action rejected"
            );
        })?;

        let constraints = match action {
            Action::Play { player, tile, .. } => self.constraints.apply_play(player, tile),
            Action::Pass { player } if !player.is_observer() => match self.game.open_ends() {
                // Constraints reflect the ends the passing player faced.
                Some(open_ends) => self.constraints.apply_pass(player, open_ends),
                None => self.constraints.clone(),
            },
            Action::Pass { .. } => self.constraints.clone(),
        };

        event!(
            target: "domino_core::oracle",
            Level::TRACE,
            action = %action,
            unknown = constraints.unknown_tiles().len(),
            "action applied"
        );

        Ok(Self {
            game,
            constraints,
            probabilities: None,
        })
    }

    /// Computes marginals with the automatic method choice.
    pub fn compute_probabilities(&self, trials: usize, seed: Option<u64>) -> Result<Self, OracleError> {
        self.compute_with(&InferenceConfig {
            method: InferenceMethod::Auto,
            trials,
            seed,
        })
    }

    pub fn compute_with(&self, config: &InferenceConfig) -> Result<Self, OracleError> {
        let table = inference::marginals(&self.constraints, config).inspect_err(|err| {
            let orphaned = self.constraints.orphaned_tiles();
            event!(
                target: "domino_core::oracle",
                Level::DEBUG,
                error = %err,
                orphaned = %orphaned,
                "inference failed"
            );
        })?;
        Ok(Self {
            probabilities: Some(table),
            ..self.clone()
        })
    }

    /// Panics if the game and the constraints disagree about the table.
    pub fn verify_consistency(&self) {
        let game = &self.game;
        let cs = &self.constraints;

        assert_eq!(game.played(), cs.played(), "played tiles diverged");
        assert_eq!(game.hand(), cs.hand(), "observer hand diverged");
        assert_eq!(game.unknown_tiles(), cs.unknown_tiles(), "unknown tiles diverged");

        let unknown = cs.unknown_tiles();
        for player in Player::OPPONENTS {
            assert_eq!(
                game.remaining(player),
                cs.remaining(player),
                "remaining count diverged for {player}"
            );
            assert!(
                cs.candidates(player).is_subset(unknown),
                "{player} has candidates outside the unknown tiles"
            );
        }
    }

    /// South's dealt hand plus every action so far.
    pub fn record(&self) -> GameRecord {
        let played_by_south: TileSet = self
            .game
            .history()
            .iter()
            .filter(|action| action.player().is_observer())
            .filter_map(Action::tile)
            .collect();
        let hand: Vec<Tile> = self.game.hand().union(played_by_south).to_vec();
        GameRecord {
            hand,
            actions: self.game.history().to_vec(),
        }
    }
}

/// Applies `actions` to a fresh state and computes probabilities for the result.
pub fn replay(
    hand: TileSet,
    actions: &[Action],
    trials: usize,
    seed: Option<u64>,
) -> Result<OracleState, OracleError> {
    replay_with(
        hand,
        actions,
        &InferenceConfig {
            method: InferenceMethod::Auto,
            trials,
            seed,
        },
    )
}

pub fn replay_with(
    hand: TileSet,
    actions: &[Action],
    config: &InferenceConfig,
) -> Result<OracleState, OracleError> {
    let state = actions
        .iter()
        .try_fold(OracleState::initial(hand)?, |state, action| {
            state.apply_action(*action)
        })?;
    state.compute_with(config)
}
