use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, LeagueEntity, Side, WeekEntity, WeekStatus, Winner},
    dto::{format_timestamp, format_week_label, validation::validate_selections},
};

/// League summary exposed to members.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct LeagueView {
    pub id: String,
    pub name: String,
    pub current_week_id: Option<String>,
    pub current_week_label: Option<String>,
    pub points_per_correct: u32,
    pub members: Vec<String>,
}

impl From<LeagueEntity> for LeagueView {
    fn from(league: LeagueEntity) -> Self {
        Self {
            current_week_label: league.current_week_id.as_deref().map(format_week_label),
            id: league.id,
            name: league.name,
            current_week_id: league.current_week_id,
            points_per_correct: league.points_per_correct,
            members: league.members,
        }
    }
}

/// One game of a week with its result once known.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    pub event_key: String,
    pub home: String,
    pub away: String,
    /// RFC 3339 kickoff.
    pub start_time: String,
    pub final_score_home: Option<i32>,
    pub final_score_away: Option<i32>,
    pub winner: Option<Winner>,
    pub decided: bool,
}

impl From<GameEntity> for GameView {
    fn from(game: GameEntity) -> Self {
        Self {
            start_time: format_timestamp(game.start_time),
            event_key: game.event_key,
            home: game.home,
            away: game.away,
            final_score_home: game.final_score_home,
            final_score_away: game.final_score_away,
            winner: game.winner,
            decided: game.decided,
        }
    }
}

/// A week with its games in kickoff order.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekView {
    pub league_id: String,
    pub week_id: String,
    pub week_label: String,
    pub deadline: Option<String>,
    /// Whether picks are read-only right now.
    pub locked: bool,
    pub status: WeekStatus,
    pub finalized_at: Option<String>,
    pub tiebreaker_event_key: Option<String>,
    pub games: Vec<GameView>,
}

impl WeekView {
    /// Assemble the view, evaluating the lock at `now`.
    pub fn new(week: WeekEntity, games: Vec<GameEntity>, now: OffsetDateTime) -> Self {
        Self {
            locked: week.picks_locked(now),
            week_label: format_week_label(&week.id),
            deadline: week.deadline.map(format_timestamp),
            finalized_at: week.finalized_at.map(format_timestamp),
            league_id: week.league_id,
            week_id: week.id,
            status: week.status,
            tiebreaker_event_key: week.tiebreaker_event_key,
            games: games.into_iter().map(GameView::from).collect(),
        }
    }
}

/// A user's picks for a week, replacing any earlier submission.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitPickRequest {
    #[validate(custom(function = "validate_selections"))]
    #[serde(default)]
    #[schema(value_type = Object)]
    pub selections: BTreeMap<String, Side>,
    /// Predicted home-minus-away differential on the tiebreaker game.
    #[validate(range(min = -200, max = 200))]
    #[serde(default)]
    pub tiebreaker: Option<i32>,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn week_view_reports_effective_lock() {
        let week = WeekEntity {
            league_id: "l1".into(),
            id: "2025-W36".into(),
            deadline: Some(datetime!(2025-09-06 16:00 UTC)),
            locked: false,
            tiebreaker_event_key: None,
            status: WeekStatus::Open,
            finalized_at: None,
            sport_key: None,
        };

        let before = WeekView::new(week.clone(), Vec::new(), datetime!(2025-09-06 15:59 UTC));
        assert!(!before.locked);
        let after = WeekView::new(week, Vec::new(), datetime!(2025-09-06 16:00 UTC));
        assert!(after.locked);
        assert_eq!(after.week_label, "Week 36 (2025)");
        assert_eq!(after.deadline.as_deref(), Some("2025-09-06T16:00:00Z"));
    }

    #[test]
    fn pick_request_rejects_wild_tiebreaker() {
        let request: SubmitPickRequest =
            serde_json::from_str(r#"{ "selections": { "g1": "home" }, "tiebreaker": 999 }"#)
                .unwrap();
        assert!(request.validate().is_err());

        let request: SubmitPickRequest =
            serde_json::from_str(r#"{ "selections": { "g1": "away" }, "tiebreaker": -7 }"#)
                .unwrap();
        assert!(request.validate().is_ok());
    }
}
