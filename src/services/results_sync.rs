//! Pulls completed scores from the provider and writes them onto a week's games.

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    config::ProviderConfig,
    dao::{
        league_store::LeagueStore,
        models::{GameEntity, WeekEntity},
    },
    error::ServiceError,
    provider::{ProviderScore, ScoresProvider, ScoresQuery},
    services::matcher::{MatchSource, apply_results, match_results},
};

/// Largest lookback the admin event-id sync will request.
const MAX_EVENT_LOOKBACK_DAYS: u32 = 30;

/// Which provider records a sync asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Recently completed games for the sport, short window then long window.
    Recent,
    /// The given events (all of the week's games when empty), looking back to the
    /// earliest kickoff among them.
    Events(Vec<String>),
}

/// Outcome of one sync for a week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub fetched: usize,
    /// Event keys that became decided.
    pub updated: Vec<String>,
}

/// Sport key used to query results for `week`.
pub fn sport_key_for<'a>(week: &'a WeekEntity, settings: &'a ProviderConfig) -> &'a str {
    week.sport_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .unwrap_or(&settings.default_sport_key)
}

async fn fetch_soft(provider: &dyn ScoresProvider, query: ScoresQuery) -> Vec<ProviderScore> {
    let sport = query.sport_key.clone();
    let days_from = query.days_from;
    match provider.fetch_scores(query).await {
        Ok(scores) => scores,
        Err(err) => {
            warn!(
                %sport,
                ?days_from,
                error = %err,
                "scores provider unavailable; no results this cycle"
            );
            Vec::new()
        }
    }
}

/// Fetch recent scores, widening to the long lookback when the short one is empty.
///
/// Provider failures are logged and produce an empty list.
pub async fn fetch_recent_scores(
    provider: &dyn ScoresProvider,
    settings: &ProviderConfig,
    sport_key: &str,
) -> Vec<ProviderScore> {
    let query = |days| ScoresQuery {
        sport_key: sport_key.to_owned(),
        days_from: Some(days),
        event_ids: Vec::new(),
    };

    let scores = fetch_soft(provider, query(settings.short_lookback_days)).await;
    if !scores.is_empty() || settings.long_lookback_days <= settings.short_lookback_days {
        return scores;
    }
    debug!(
        sport = %sport_key,
        days = settings.long_lookback_days,
        "short lookback returned nothing; widening"
    );
    fetch_soft(provider, query(settings.long_lookback_days)).await
}

/// Days of history needed to cover every game's kickoff, plus one day of slack.
pub fn lookback_days_for(games: &[GameEntity], now: OffsetDateTime) -> u32 {
    let Some(earliest) = games.iter().map(|game| game.start_time).min() else {
        return 0;
    };
    let seconds = u64::try_from((now - earliest).whole_seconds()).unwrap_or(0);
    let days = seconds.div_ceil(86_400) + 1;
    u32::try_from(days)
        .unwrap_or(MAX_EVENT_LOOKBACK_DAYS)
        .min(MAX_EVENT_LOOKBACK_DAYS)
}

/// Match provider results against the week's undecided games and persist the settled ones.
pub async fn sync_week_results(
    store: &dyn LeagueStore,
    provider: &dyn ScoresProvider,
    settings: &ProviderConfig,
    week: &WeekEntity,
    scope: SyncScope,
    now: OffsetDateTime,
) -> Result<SyncOutcome, ServiceError> {
    let games = store.list_games(&week.league_id, &week.id).await?;
    if games.iter().all(|game| game.decided) {
        debug!(league_id = %week.league_id, week_id = %week.id, "no undecided games to sync");
        return Ok(SyncOutcome::default());
    }

    let sport_key = sport_key_for(week, settings);
    let scores = match scope {
        SyncScope::Recent => fetch_recent_scores(provider, settings, sport_key).await,
        SyncScope::Events(event_ids) => {
            let event_ids = if event_ids.is_empty() {
                games.iter().map(|game| game.event_key.clone()).collect()
            } else {
                event_ids
            };
            let query = ScoresQuery {
                sport_key: sport_key.to_owned(),
                days_from: Some(lookback_days_for(&games, now)),
                event_ids,
            };
            fetch_soft(provider, query).await
        }
    };
    if scores.is_empty() {
        return Ok(SyncOutcome::default());
    }

    let results = match_results(&games, &scores);
    let by_teams = results
        .iter()
        .filter(|result| result.source == MatchSource::TeamsAndDate)
        .count();
    let updated = apply_results(&games, &results);
    let outcome = SyncOutcome {
        fetched: scores.len(),
        updated: updated.iter().map(|game| game.event_key.clone()).collect(),
    };

    if !updated.is_empty() {
        store.save_games(updated).await?;
        info!(
            league_id = %week.league_id,
            week_id = %week.id,
            fetched = outcome.fetched,
            updated = outcome.updated.len(),
            matched_by_id = results.len() - by_teams,
            matched_by_teams = by_teams,
            "applied provider results"
        );
    }

    Ok(outcome)
}
