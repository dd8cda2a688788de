use std::collections::{BTreeMap, HashMap};

use crate::dao::models::{GameEntity, Side, UserPickEntity, WeekScoreEntity, Winner};

use super::{tiebreaker_abs_error, tiebreaker_actual, winner_of};

/// Points per correct pick when a league does not configure it.
pub const DEFAULT_POINTS_PER_CORRECT: u32 = 1;
/// Games an admin selects for each week.
pub const GAMES_PER_WEEK: usize = 6;

/// League-level knobs applied while scoring a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringSettings {
    pub points_per_correct: u32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_correct: DEFAULT_POINTS_PER_CORRECT,
        }
    }
}

/// Score of one user for one week.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekScore {
    pub correct: u32,
    /// Decided non-tie games of the week, picked or not.
    pub total: u32,
    pub points: u32,
    pub tiebreaker_prediction: Option<i32>,
    pub tiebreaker_actual: Option<i32>,
    pub tiebreaker_abs_error: Option<u32>,
}

impl WeekScore {
    /// Attach the document keys this score is persisted under.
    pub fn into_entity(self, league_id: &str, week_id: &str, user_id: &str) -> WeekScoreEntity {
        WeekScoreEntity {
            league_id: league_id.to_owned(),
            week_id: week_id.to_owned(),
            user_id: user_id.to_owned(),
            correct: self.correct,
            total: self.total,
            points: self.points,
            tiebreaker_prediction: self.tiebreaker_prediction,
            tiebreaker_actual: self.tiebreaker_actual,
            tiebreaker_abs_error: self.tiebreaker_abs_error,
        }
    }
}

/// Score a user's selections against the week's games.
///
/// Picks on unknown or undecided games are ignored and ties never count. The
/// tiebreaker is evaluated independently against `tiebreaker_event_key`.
pub fn compute_week_score(
    selections: &BTreeMap<String, Side>,
    games: &[GameEntity],
    settings: ScoringSettings,
    tiebreaker_event_key: Option<&str>,
    tiebreaker_prediction: Option<i32>,
) -> WeekScore {
    let by_key: HashMap<&str, &GameEntity> = games
        .iter()
        .map(|game| (game.event_key.as_str(), game))
        .collect();

    let total = games
        .iter()
        .filter(|game| game.decided)
        .filter(|game| matches!(winner_of(game), Some(Winner::Home | Winner::Away)))
        .count() as u32;

    let correct = selections
        .iter()
        .filter_map(|(event_key, side)| {
            let game = by_key.get(event_key.as_str())?;
            if !game.decided {
                return None;
            }
            winner_of(game).filter(|winner| winner.favours(*side))
        })
        .count() as u32;

    let actual = tiebreaker_event_key
        .and_then(|key| by_key.get(key))
        .and_then(|game| tiebreaker_actual(game));

    WeekScore {
        correct,
        total,
        points: correct.saturating_mul(settings.points_per_correct),
        tiebreaker_prediction,
        tiebreaker_actual: actual,
        tiebreaker_abs_error: tiebreaker_abs_error(tiebreaker_prediction, actual),
    }
}

/// A pick is complete once every game of the week is chosen and a tiebreaker given.
pub fn is_pick_complete(pick: &UserPickEntity) -> bool {
    pick.selections.len() == GAMES_PER_WEEK && pick.tiebreaker.is_some()
}
