use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::scoring::{self, DEFAULT_POINTS_PER_CORRECT};

/// Side of a game a user can pick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Final outcome of a decided game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Home,
    Away,
    Tie,
}

impl Winner {
    /// Whether a pick on `side` agrees with this outcome. Ties never agree.
    pub fn favours(self, side: Side) -> bool {
        matches!(
            (self, side),
            (Winner::Home, Side::Home) | (Winner::Away, Side::Away)
        )
    }
}

/// Lifecycle of a week: picks are scored while open, the week is frozen once final.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    #[default]
    Open,
    Final,
}

/// League settings and roster read by the scoring procedures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeagueEntity {
    /// Stable identifier for the league.
    pub id: String,
    /// Display name of the league.
    #[serde(default)]
    pub name: String,
    /// Week currently presented to members.
    #[serde(default)]
    pub current_week_id: Option<String>,
    /// Points awarded for each correct pick.
    #[serde(default = "default_points_per_correct")]
    pub points_per_correct: u32,
    /// User ids of the league members.
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_points_per_correct() -> u32 {
    DEFAULT_POINTS_PER_CORRECT
}

/// A league week grouping the games members pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekEntity {
    /// League owning the week.
    pub league_id: String,
    /// Week identifier, `YYYY-Www`.
    pub id: String,
    /// Picks lock once this instant passes.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    /// Manual lock override.
    #[serde(default)]
    pub locked: bool,
    /// Game whose point differential breaks ties.
    #[serde(default)]
    pub tiebreaker_event_key: Option<String>,
    /// Open until every game of the week is decided.
    #[serde(default)]
    pub status: WeekStatus,
    /// When the week became final.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub finalized_at: Option<OffsetDateTime>,
    /// Provider sport key used to fetch results for this week.
    #[serde(default)]
    pub sport_key: Option<String>,
}

impl WeekEntity {
    /// Picks are read-only once the week is locked manually or its deadline passed.
    pub fn picks_locked(&self, now: OffsetDateTime) -> bool {
        self.locked || self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Whether the week has been finalized.
    pub fn is_final(&self) -> bool {
        self.status == WeekStatus::Final
    }
}

/// A game of a week, with its result once known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// League owning the game.
    pub league_id: String,
    /// Week the game belongs to.
    pub week_id: String,
    /// Stable game identifier (provider event id or admin-assigned key).
    pub event_key: String,
    /// Home team display name.
    pub home: String,
    /// Away team display name.
    pub away: String,
    /// Scheduled kickoff.
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default)]
    pub final_score_home: Option<i32>,
    #[serde(default)]
    pub final_score_away: Option<i32>,
    /// Stored outcome; scores take precedence whenever both are present.
    #[serde(default)]
    pub winner: Option<Winner>,
    /// Whether the result is final.
    #[serde(default)]
    pub decided: bool,
}

impl GameEntity {
    /// Check the decided/winner/score invariant of a loaded game.
    pub fn validate(&self) -> Result<(), String> {
        if !self.decided {
            return Ok(());
        }
        let Some(resolved) = scoring::winner_of(self) else {
            return Err(format!(
                "game `{}` is decided without scores or winner",
                self.event_key
            ));
        };
        match self.winner {
            Some(stored) if stored != resolved => Err(format!(
                "game `{}` stores winner {stored:?} but its scores resolve to {resolved:?}",
                self.event_key
            )),
            _ => Ok(()),
        }
    }
}

/// A user's picks for one week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPickEntity {
    pub league_id: String,
    pub week_id: String,
    pub user_id: String,
    /// Chosen side per event key.
    #[serde(default)]
    pub selections: BTreeMap<String, Side>,
    /// Predicted home-minus-away differential on the tiebreaker game.
    #[serde(default)]
    pub tiebreaker: Option<i32>,
}

/// Derived score of one user for one week, overwritten on every recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekScoreEntity {
    pub league_id: String,
    pub week_id: String,
    pub user_id: String,
    /// Picks matching a decided, non-tie winner.
    pub correct: u32,
    /// Decided non-tie games of the week.
    pub total: u32,
    /// `correct` scaled by the league's points per correct pick.
    pub points: u32,
    pub tiebreaker_prediction: Option<i32>,
    pub tiebreaker_actual: Option<i32>,
    pub tiebreaker_abs_error: Option<u32>,
}

/// Derived season totals of one user, summed over final weeks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonStandingEntity {
    pub league_id: String,
    pub user_id: String,
    pub correct: u32,
    pub total: u32,
    pub points: u32,
    /// Final weeks this user holds a score for.
    pub weeks_played: u32,
}
