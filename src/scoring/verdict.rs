use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::{GameEntity, Side, Winner};

use super::winner_of;

/// Outcome of a single pick against a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PickVerdict {
    /// Game not decided yet, or no pick was made.
    Pending,
    /// Game ended in a tie; no pick can be right.
    Tie,
    Correct,
    Incorrect,
}

/// Judge one pick. A decided tie yields [`PickVerdict::Tie`] even without a pick.
pub fn pick_verdict(pick: Option<Side>, game: &GameEntity) -> PickVerdict {
    if !game.decided {
        return PickVerdict::Pending;
    }
    let winner = winner_of(game);
    if winner == Some(Winner::Tie) {
        return PickVerdict::Tie;
    }
    match (pick, winner) {
        (Some(side), Some(winner)) if winner.favours(side) => PickVerdict::Correct,
        (Some(_), Some(_)) => PickVerdict::Incorrect,
        _ => PickVerdict::Pending,
    }
}
