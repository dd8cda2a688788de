//! Orchestration of the scoring pipeline for the scheduled poll, game writes and
//! admin actions. Every path funnels through [`refresh_week`] so identical inputs
//! produce identical documents whatever triggered the run.

use time::OffsetDateTime;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{LeagueEntity, SeasonStandingEntity},
    },
    dto::admin::LeagueAdvance,
    error::ServiceError,
    services::{
        recompute_service::{WeekRecomputation, advance_league, load_week, recompute_week},
        results_sync::{SyncOutcome, SyncScope, sync_week_results},
        season_service::recompute_season,
        sse_events,
    },
    state::SharedState,
};

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Present when the run pulled provider results first.
    pub sync: Option<SyncOutcome>,
    pub week: WeekRecomputation,
    /// Ranked season standings after the run.
    pub standings: Vec<SeasonStandingEntity>,
}

/// Counters of a scheduled poll across all leagues.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub refreshed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Optionally sync provider results, then recompute the week and the season and
/// broadcast both.
pub async fn refresh_week(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    sync: Option<SyncScope>,
) -> Result<RefreshOutcome, ServiceError> {
    let store = state.require_league_store().await?;
    let run_id = Uuid::new_v4();
    let span = info_span!("refresh_week", %run_id, league_id, week_id);

    async move {
        let now = OffsetDateTime::now_utc();
        let sync = match sync {
            Some(scope) => {
                let week = load_week(store.as_ref(), league_id, week_id).await?;
                let outcome = sync_week_results(
                    store.as_ref(),
                    state.provider(),
                    &state.config().provider,
                    &week,
                    scope,
                    now,
                )
                .await?;
                Some(outcome)
            }
            None => None,
        };

        let week = recompute_week(store.as_ref(), league_id, week_id, now).await?;
        sse_events::broadcast_week_recomputed(state, &week);

        let standings = recompute_season(store.as_ref(), league_id).await?;
        sse_events::broadcast_season_updated(state, league_id, &standings);

        info!(
            status = ?week.status,
            finalized = week.finalized,
            updated_games = sync.as_ref().map_or(0, |outcome| outcome.updated.len()),
            "week refreshed"
        );
        Ok(RefreshOutcome {
            sync,
            week,
            standings,
        })
    }
    .instrument(span)
    .await
}

/// Game-write trigger: recompute the week the written game belongs to.
pub async fn on_game_written(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<RefreshOutcome, ServiceError> {
    refresh_week(state, league_id, week_id, None).await
}

/// Recompute every week of a league, then its season once.
///
/// Used after scoring settings change, since every stored score depends on them.
pub async fn rescore_league(
    state: &SharedState,
    league_id: &str,
) -> Result<Vec<SeasonStandingEntity>, ServiceError> {
    let store = state.require_league_store().await?;
    let now = OffsetDateTime::now_utc();

    for week in store.list_weeks(league_id).await? {
        let run = recompute_week(store.as_ref(), league_id, &week.id, now).await?;
        sse_events::broadcast_week_recomputed(state, &run);
    }

    let standings = recompute_season(store.as_ref(), league_id).await?;
    sse_events::broadcast_season_updated(state, league_id, &standings);
    Ok(standings)
}

/// Scheduled poll: sync and recompute the current week of every league.
///
/// A failing league is logged and never blocks the others.
pub async fn poll_all_leagues(state: &SharedState) -> PollReport {
    let mut report = PollReport::default();
    let store = match state.require_league_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "skipping results poll");
            return report;
        }
    };
    let leagues = match store.list_leagues().await {
        Ok(leagues) => leagues,
        Err(err) => {
            error!(error = %err, "failed to list leagues for results poll");
            return report;
        }
    };

    for league in leagues {
        let Some(week_id) = league.current_week_id.as_deref() else {
            debug!(league_id = %league.id, "league has no current week");
            report.skipped += 1;
            continue;
        };
        match refresh_week(state, &league.id, week_id, Some(SyncScope::Recent)).await {
            Ok(_) => report.refreshed += 1,
            Err(err) => {
                error!(league_id = %league.id, week_id, error = %err, "league refresh failed");
                report.failed += 1;
            }
        }
    }

    info!(
        refreshed = report.refreshed,
        failed = report.failed,
        skipped = report.skipped,
        "results poll complete"
    );
    report
}

/// Weekly sweep: move every league whose current week is final to its next week.
pub async fn advance_completed_weeks(
    state: &SharedState,
) -> Result<Vec<LeagueAdvance>, ServiceError> {
    let store = state.require_league_store().await?;
    let mut advanced = Vec::new();

    for league in store.list_leagues().await? {
        let Some(week_id) = league.current_week_id.clone() else {
            continue;
        };
        let league_id = league.id.clone();
        let result = advance_if_final(store.as_ref(), league, &week_id).await;

        match result {
            Ok(Some(next)) => advanced.push(LeagueAdvance {
                league_id,
                week_id: next,
            }),
            Ok(None) => {}
            Err(err) => {
                error!(%league_id, %week_id, error = %err, "weekly advance failed");
            }
        }
    }

    info!(advanced = advanced.len(), "weekly advance sweep complete");
    Ok(advanced)
}

async fn advance_if_final(
    store: &dyn LeagueStore,
    league: LeagueEntity,
    week_id: &str,
) -> Result<Option<String>, ServiceError> {
    match store.find_week(&league.id, week_id).await? {
        Some(week) if week.is_final() => advance_league(store, league, week_id).await,
        _ => Ok(None),
    }
}
