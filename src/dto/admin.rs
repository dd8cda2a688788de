//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{WeekStatus, Winner},
    dto::{
        leaderboard::{SeasonStandingView, WeekScoreView},
        validation::{validate_week_games, validate_week_id},
    },
};

/// Seed or replace a league's settings and roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpsertLeagueRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[validate(custom(function = "validate_week_id"))]
    #[serde(default)]
    pub current_week_id: Option<String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub points_per_correct: Option<u32>,
}

/// Game selected for a week.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GameInput {
    pub event_key: String,
    pub home: String,
    pub away: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub start_time: OffsetDateTime,
}

/// Seed or replace a week and its game selection.
///
/// Results already recorded for a kept event key survive the replacement.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpsertWeekRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deadline: Option<OffsetDateTime>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub tiebreaker_event_key: Option<String>,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[validate(custom(function = "validate_week_games"))]
    pub games: Vec<GameInput>,
}

/// Event ids to fetch from the provider; every game of the week when empty.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SyncRequest {
    #[serde(default)]
    pub event_ids: Vec<String>,
}

/// Manual final score entry.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetResultRequest {
    #[validate(range(min = 0, max = 300))]
    pub final_score_home: i32,
    #[validate(range(min = 0, max = 300))]
    pub final_score_away: i32,
}

/// Record an outcome without scores.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetWinnerRequest {
    pub winner: Winner,
}

/// Designate the game whose differential breaks ties.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetTiebreakerRequest {
    #[validate(length(min = 1))]
    pub event_key: String,
}

/// League scoring settings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScoringSettingsRequest {
    #[validate(range(min = 1, max = 100))]
    pub points_per_correct: u32,
}

/// Outcome of a week recomputation, with the refreshed season standings.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct RecomputeResponse {
    pub league_id: String,
    pub week_id: String,
    pub status: WeekStatus,
    pub finalized: bool,
    pub advanced_to: Option<String>,
    /// Provider records fetched, when the run synced results first.
    pub fetched: Option<usize>,
    /// Games that became decided during this run.
    pub updated_games: Vec<String>,
    pub scores: Vec<WeekScoreView>,
    pub standings: Vec<SeasonStandingView>,
}

/// League moved to a new current week.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeagueAdvance {
    pub league_id: String,
    pub week_id: String,
}

/// Result of a weekly advance sweep.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceResponse {
    pub advanced: Vec<LeagueAdvance>,
}

/// Members who still owe picks for a week.
#[derive(Debug, Serialize, ToSchema)]
pub struct IncompletePicksResponse {
    pub league_id: String,
    pub week_id: String,
    /// Whether picks are already read-only.
    pub locked: bool,
    pub users: Vec<String>,
}
