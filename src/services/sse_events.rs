use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::SeasonStandingEntity,
    dto::{
        format_week_label,
        leaderboard::{season_standing_views, week_score_views},
        sse::{SeasonUpdatedEvent, ServerEvent, WeekRecomputedEvent},
    },
    services::recompute_service::WeekRecomputation,
    state::SharedState,
};

const EVENT_WEEK_RECOMPUTED: &str = "week.recomputed";
const EVENT_SEASON_UPDATED: &str = "season.updated";

/// Broadcast the result of a week recomputation.
pub fn broadcast_week_recomputed(state: &SharedState, run: &WeekRecomputation) {
    let payload = WeekRecomputedEvent {
        league_id: run.league_id.clone(),
        week_id: run.week_id.clone(),
        week_label: format_week_label(&run.week_id),
        status: run.status,
        finalized: run.finalized,
        advanced_to: run.advanced_to.clone(),
        scores: week_score_views(&run.scores),
    };
    send_public_event(state, EVENT_WEEK_RECOMPUTED, &payload);
}

/// Broadcast freshly ranked season standings.
pub fn broadcast_season_updated(
    state: &SharedState,
    league_id: &str,
    standings: &[SeasonStandingEntity],
) {
    let payload = SeasonUpdatedEvent {
        league_id: league_id.to_owned(),
        standings: season_standing_views(standings),
    };
    send_public_event(state, EVENT_SEASON_UPDATED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
