//! Leaderboard and pick verdict projections served to league members.

use indexmap::IndexMap;
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    dao::models::{SeasonStandingEntity, WeekScoreEntity, WeekStatus},
    scoring::{PickVerdict, accuracy},
};

/// One row of a week leaderboard.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeekScoreView {
    /// 1-based position in leaderboard order.
    pub rank: usize,
    pub user_id: String,
    pub correct: u32,
    pub total: u32,
    pub points: u32,
    pub tiebreaker_prediction: Option<i32>,
    pub tiebreaker_actual: Option<i32>,
    pub tiebreaker_abs_error: Option<u32>,
}

/// Project already ranked week scores, numbering them in order.
pub fn week_score_views(scores: &[WeekScoreEntity]) -> Vec<WeekScoreView> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| WeekScoreView {
            rank: index + 1,
            user_id: score.user_id.clone(),
            correct: score.correct,
            total: score.total,
            points: score.points,
            tiebreaker_prediction: score.tiebreaker_prediction,
            tiebreaker_actual: score.tiebreaker_actual,
            tiebreaker_abs_error: score.tiebreaker_abs_error,
        })
        .collect()
}

/// Week leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekLeaderboardResponse {
    pub league_id: String,
    pub week_id: String,
    /// Human readable week, e.g. `Week 36 (2025)`.
    pub week_label: String,
    pub status: WeekStatus,
    pub scores: Vec<WeekScoreView>,
}

/// One row of the season leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeasonStandingView {
    pub rank: usize,
    pub user_id: String,
    pub correct: u32,
    pub total: u32,
    pub points: u32,
    /// `correct / total`, zero before any decided game.
    pub accuracy: f64,
    pub weeks_played: u32,
}

/// Project already ranked standings, numbering them in order.
pub fn season_standing_views(standings: &[SeasonStandingEntity]) -> Vec<SeasonStandingView> {
    standings
        .iter()
        .enumerate()
        .map(|(index, standing)| SeasonStandingView {
            rank: index + 1,
            user_id: standing.user_id.clone(),
            correct: standing.correct,
            total: standing.total,
            points: standing.points,
            accuracy: accuracy(standing.correct, standing.total),
            weeks_played: standing.weeks_played,
        })
        .collect()
}

/// Season leaderboard of a league.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeasonLeaderboardResponse {
    pub league_id: String,
    pub standings: Vec<SeasonStandingView>,
}

/// Verdict of each of a user's picks for one week, keyed by event key in kickoff order.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PickVerdictsResponse {
    pub league_id: String,
    pub week_id: String,
    pub user_id: String,
    pub tiebreaker: Option<i32>,
    #[schema(value_type = Object)]
    pub verdicts: IndexMap<String, PickVerdict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_are_numbered_in_order() {
        let standing = |user_id: &str, correct| SeasonStandingEntity {
            league_id: "l1".into(),
            user_id: user_id.into(),
            correct,
            total: 10,
            points: correct,
            weeks_played: 2,
        };
        let views = season_standing_views(&[standing("bob", 8), standing("alice", 5)]);

        assert_eq!(views[0].rank, 1);
        assert_eq!(views[0].user_id, "bob");
        assert!((views[0].accuracy - 0.8).abs() < f64::EPSILON);
        assert_eq!(views[1].rank, 2);
    }

    #[test]
    fn missing_tiebreaker_fields_are_omitted() {
        let score = WeekScoreEntity {
            league_id: "l1".into(),
            week_id: "2025-W36".into(),
            user_id: "alice".into(),
            correct: 1,
            total: 2,
            points: 1,
            tiebreaker_prediction: None,
            tiebreaker_actual: None,
            tiebreaker_abs_error: None,
        };
        let json = serde_json::to_value(&week_score_views(&[score])[0]).unwrap();
        assert!(json.get("tiebreaker_actual").is_none());
        assert_eq!(json["rank"], 1);
    }
}
