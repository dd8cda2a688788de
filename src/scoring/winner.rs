use std::cmp::Ordering;

use crate::dao::models::{GameEntity, Winner};

/// Resolve the winner from final scores, `None` while either score is unknown.
pub fn resolve_winner(home: Option<i32>, away: Option<i32>) -> Option<Winner> {
    let (home, away) = (home?, away?);
    Some(match home.cmp(&away) {
        Ordering::Greater => Winner::Home,
        Ordering::Less => Winner::Away,
        Ordering::Equal => Winner::Tie,
    })
}

/// Winner of a game as every scoring path sees it.
///
/// Scores win whenever both are present; the stored `winner` only counts when an
/// admin recorded an outcome without scores.
pub fn winner_of(game: &GameEntity) -> Option<Winner> {
    resolve_winner(game.final_score_home, game.final_score_away).or(game.winner)
}
