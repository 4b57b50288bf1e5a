//! Hard constraints on the hidden hands.
//!
//! - `player`: per-opponent candidate sets, hand sizes and eliminated pips.
//! - `set`: the three-opponent snapshot, play/pass updates and propagation.

mod player;
mod set;

pub use player::PlayerConstraints;
pub use set::{ConstraintSet, MAX_PROPAGATION_ROUNDS};
