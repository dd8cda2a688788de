use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    dao::models::WeekStatus,
    dto::leaderboard::{SeasonStandingView, WeekScoreView},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already encoded data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
/// Emitted after a week's scores were recomputed.
pub struct WeekRecomputedEvent {
    pub league_id: String,
    pub week_id: String,
    pub week_label: String,
    pub status: WeekStatus,
    pub finalized: bool,
    pub advanced_to: Option<String>,
    /// Leaderboard order.
    pub scores: Vec<WeekScoreView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted after the season standings of a league were rebuilt.
pub struct SeasonUpdatedEvent {
    pub league_id: String,
    pub standings: Vec<SeasonStandingView>,
}
