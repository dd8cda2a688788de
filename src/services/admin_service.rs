//! Business logic powering the admin REST routes: seeding, manual results and
//! on-demand runs of the scoring pipeline.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    dao::models::{GameEntity, LeagueEntity, WeekEntity},
    dto::{
        admin::{
            AdvanceResponse, IncompletePicksResponse, RecomputeResponse, ScoringSettingsRequest,
            SetResultRequest, SetTiebreakerRequest, SetWinnerRequest, SyncRequest,
            UpsertLeagueRequest, UpsertWeekRequest,
        },
        leaderboard::{season_standing_views, week_score_views},
        public::{LeagueView, WeekView},
        validation::parse_week_id,
    },
    error::ServiceError,
    scoring::{DEFAULT_POINTS_PER_CORRECT, is_pick_complete, resolve_winner},
    services::{
        league_service::{self, RefreshOutcome},
        recompute_service::{load_league, load_week},
        results_sync::SyncScope,
    },
    state::SharedState,
};

/// Simulated final scores fall in this range, inclusive.
const SIMULATED_SCORE_RANGE: std::ops::RangeInclusive<i32> = 10..=40;

fn recompute_response(outcome: RefreshOutcome, extra_updates: Vec<String>) -> RecomputeResponse {
    let (fetched, mut updated_games) = match outcome.sync {
        Some(sync) => (Some(sync.fetched), sync.updated),
        None => (None, Vec::new()),
    };
    updated_games.extend(extra_updates);

    RecomputeResponse {
        league_id: outcome.week.league_id,
        week_id: outcome.week.week_id,
        status: outcome.week.status,
        finalized: outcome.week.finalized,
        advanced_to: outcome.week.advanced_to,
        fetched,
        updated_games,
        scores: week_score_views(&outcome.week.scores),
        standings: season_standing_views(&outcome.standings),
    }
}

async fn find_game(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    event_key: &str,
) -> Result<GameEntity, ServiceError> {
    let store = state.require_league_store().await?;
    store
        .list_games(league_id, week_id)
        .await?
        .into_iter()
        .find(|game| game.event_key == event_key)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("game `{event_key}` not found in week `{week_id}`"))
        })
}

/// Recompute a week and its season without contacting the provider.
pub async fn recompute(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<RecomputeResponse, ServiceError> {
    let outcome = league_service::refresh_week(state, league_id, week_id, None).await?;
    Ok(recompute_response(outcome, Vec::new()))
}

/// Pull results for specific events (or the whole week), then recompute.
pub async fn sync(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    request: SyncRequest,
) -> Result<RecomputeResponse, ServiceError> {
    let event_ids = request
        .event_ids
        .into_iter()
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .collect();
    let outcome = league_service::refresh_week(
        state,
        league_id,
        week_id,
        Some(SyncScope::Events(event_ids)),
    )
    .await?;
    Ok(recompute_response(outcome, Vec::new()))
}

/// Give every undecided game of the week a random final score, then recompute.
pub async fn simulate_finals(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<RecomputeResponse, ServiceError> {
    let store = state.require_league_store().await?;
    load_week(store.as_ref(), league_id, week_id).await?;

    let undecided: Vec<GameEntity> = store
        .list_games(league_id, week_id)
        .await?
        .into_iter()
        .filter(|game| !game.decided)
        .collect();
    let simulated: Vec<GameEntity> = {
        let mut rng = rand::rng();
        undecided
            .into_iter()
            .map(|mut game| {
                let home = rng.random_range(SIMULATED_SCORE_RANGE);
                let away = rng.random_range(SIMULATED_SCORE_RANGE);
                game.final_score_home = Some(home);
                game.final_score_away = Some(away);
                game.winner = resolve_winner(Some(home), Some(away));
                game.decided = true;
                game
            })
            .collect()
    };
    let keys: Vec<String> = simulated.iter().map(|game| game.event_key.clone()).collect();
    if !simulated.is_empty() {
        store.save_games(simulated).await?;
    }
    warn!(league_id, week_id, games = keys.len(), "simulated final scores");

    let outcome = league_service::on_game_written(state, league_id, week_id).await?;
    Ok(recompute_response(outcome, keys))
}

/// Record final scores for one game; the winner follows from them.
pub async fn set_result(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    event_key: &str,
    request: SetResultRequest,
) -> Result<RecomputeResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let mut game = find_game(state, league_id, week_id, event_key).await?;

    let home = Some(request.final_score_home);
    let away = Some(request.final_score_away);
    game.final_score_home = home;
    game.final_score_away = away;
    game.winner = resolve_winner(home, away);
    game.decided = game.winner.is_some();
    store.save_games(vec![game]).await?;
    info!(league_id, week_id, event_key, "manual result recorded");

    let outcome = league_service::on_game_written(state, league_id, week_id).await?;
    Ok(recompute_response(outcome, vec![event_key.to_owned()]))
}

/// Record an outcome without scores. Any stored scores are cleared so the winner stands.
pub async fn set_winner_only(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    event_key: &str,
    request: SetWinnerRequest,
) -> Result<RecomputeResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let mut game = find_game(state, league_id, week_id, event_key).await?;

    game.final_score_home = None;
    game.final_score_away = None;
    game.winner = Some(request.winner);
    game.decided = true;
    store.save_games(vec![game]).await?;
    info!(league_id, week_id, event_key, winner = ?request.winner, "manual winner recorded");

    let outcome = league_service::on_game_written(state, league_id, week_id).await?;
    Ok(recompute_response(outcome, vec![event_key.to_owned()]))
}

/// Choose the tiebreaker game of a week.
pub async fn set_tiebreaker(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    request: SetTiebreakerRequest,
) -> Result<RecomputeResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let mut week = load_week(store.as_ref(), league_id, week_id).await?;
    find_game(state, league_id, week_id, &request.event_key).await?;

    week.tiebreaker_event_key = Some(request.event_key);
    store.save_week(week).await?;

    let outcome = league_service::on_game_written(state, league_id, week_id).await?;
    Ok(recompute_response(outcome, Vec::new()))
}

/// Change the points awarded per correct pick and rescore the whole league.
pub async fn update_scoring(
    state: &SharedState,
    league_id: &str,
    request: ScoringSettingsRequest,
) -> Result<LeagueView, ServiceError> {
    let store = state.require_league_store().await?;
    let mut league = load_league(store.as_ref(), league_id).await?;
    league.points_per_correct = request.points_per_correct;
    store.save_league(league.clone()).await?;
    info!(league_id, points_per_correct = request.points_per_correct, "scoring settings updated");

    league_service::rescore_league(state, league_id).await?;
    Ok(league.into())
}

/// Run the weekly advance sweep now.
pub async fn advance_weeks(state: &SharedState) -> Result<AdvanceResponse, ServiceError> {
    let advanced = league_service::advance_completed_weeks(state).await?;
    Ok(AdvanceResponse { advanced })
}

/// Members whose pick for the week is missing or incomplete.
pub async fn incomplete_picks(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<IncompletePicksResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let league = load_league(store.as_ref(), league_id).await?;
    let week = load_week(store.as_ref(), league_id, week_id).await?;
    let complete: HashSet<String> = store
        .list_picks(league_id, week_id)
        .await?
        .into_iter()
        .filter(is_pick_complete)
        .map(|pick| pick.user_id)
        .collect();

    let mut users: Vec<String> = league
        .members
        .into_iter()
        .filter(|member| !complete.contains(member))
        .collect();
    users.sort();
    users.dedup();

    Ok(IncompletePicksResponse {
        league_id: league_id.to_owned(),
        week_id: week_id.to_owned(),
        locked: week.picks_locked(OffsetDateTime::now_utc()),
        users,
    })
}

/// Create or replace a league's name, roster and settings.
pub async fn upsert_league(
    state: &SharedState,
    league_id: &str,
    request: UpsertLeagueRequest,
) -> Result<LeagueView, ServiceError> {
    let store = state.require_league_store().await?;
    let existing = store.find_league(league_id).await?;

    let mut members = request.members;
    members.sort();
    members.dedup();
    let league = LeagueEntity {
        id: league_id.to_owned(),
        name: request.name,
        current_week_id: request
            .current_week_id
            .or_else(|| existing.as_ref().and_then(|league| league.current_week_id.clone())),
        points_per_correct: request
            .points_per_correct
            .or_else(|| existing.as_ref().map(|league| league.points_per_correct))
            .unwrap_or(DEFAULT_POINTS_PER_CORRECT),
        members,
    };
    store.save_league(league.clone()).await?;
    info!(league_id, members = league.members.len(), "league saved");
    Ok(league.into())
}

/// Create or replace a week and its game selection.
///
/// Recorded results of kept games survive, games cannot be dropped once selected,
/// and a final week accepts no new games.
pub async fn upsert_week(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    request: UpsertWeekRequest,
) -> Result<WeekView, ServiceError> {
    if parse_week_id(week_id).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "week id must look like `2025-W36` (got `{week_id}`)"
        )));
    }
    let store = state.require_league_store().await?;
    load_league(store.as_ref(), league_id).await?;
    let existing_week = store.find_week(league_id, week_id).await?;
    let mut existing_games: HashMap<String, GameEntity> = store
        .list_games(league_id, week_id)
        .await?
        .into_iter()
        .map(|game| (game.event_key.clone(), game))
        .collect();

    let requested: HashSet<&str> = request
        .games
        .iter()
        .map(|game| game.event_key.trim())
        .collect();
    if let Some(dropped) = existing_games.keys().find(|key| !requested.contains(key.as_str())) {
        return Err(ServiceError::InvalidState(format!(
            "game `{dropped}` is already selected and cannot be removed"
        )));
    }
    if let Some(key) = request.tiebreaker_event_key.as_deref() {
        if !requested.contains(key) {
            return Err(ServiceError::InvalidInput(format!(
                "tiebreaker game `{key}` is not part of the week"
            )));
        }
    }
    let is_final = existing_week.as_ref().is_some_and(WeekEntity::is_final);
    if is_final && requested.len() > existing_games.len() {
        return Err(ServiceError::InvalidState(format!(
            "week `{week_id}` is final and accepts no new games"
        )));
    }

    let games: Vec<GameEntity> = request
        .games
        .into_iter()
        .map(|input| {
            let event_key = input.event_key.trim().to_owned();
            let result = existing_games.remove(&event_key);
            GameEntity {
                league_id: league_id.to_owned(),
                week_id: week_id.to_owned(),
                home: input.home,
                away: input.away,
                start_time: input.start_time,
                final_score_home: result.as_ref().and_then(|game| game.final_score_home),
                final_score_away: result.as_ref().and_then(|game| game.final_score_away),
                winner: result.as_ref().and_then(|game| game.winner),
                decided: result.as_ref().is_some_and(|game| game.decided),
                event_key,
            }
        })
        .collect();

    let week = WeekEntity {
        league_id: league_id.to_owned(),
        id: week_id.to_owned(),
        deadline: request.deadline,
        locked: request.locked,
        tiebreaker_event_key: request.tiebreaker_event_key,
        status: existing_week.as_ref().map(|week| week.status).unwrap_or_default(),
        finalized_at: existing_week.and_then(|week| week.finalized_at),
        sport_key: request.sport_key.filter(|key| !key.trim().is_empty()),
    };
    store.save_week(week).await?;
    store.save_games(games).await?;
    info!(league_id, week_id, "week saved");

    league_service::on_game_written(state, league_id, week_id).await?;
    let week = load_week(store.as_ref(), league_id, week_id).await?;
    let games = store.list_games(league_id, week_id).await?;
    Ok(WeekView::new(week, games, OffsetDateTime::now_utc()))
}
