//! Week recomputation: score every member, persist the scores, finalize and advance.

use std::collections::{BTreeMap, BTreeSet};

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{LeagueEntity, WeekEntity, WeekScoreEntity, WeekStatus},
    },
    error::ServiceError,
    scoring::{ScoringSettings, compute_week_score, rank_week_scores},
};

/// Result of recomputing one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRecomputation {
    pub league_id: String,
    pub week_id: String,
    /// Scores of every member, leaderboard order.
    pub scores: Vec<WeekScoreEntity>,
    pub status: WeekStatus,
    /// Whether this run moved the week from open to final.
    pub finalized: bool,
    /// Week the league advanced to during this run.
    pub advanced_to: Option<String>,
}

/// First week id after `current`, in id order.
pub fn next_week_id(weeks: &[WeekEntity], current: &str) -> Option<String> {
    weeks
        .iter()
        .map(|week| week.id.as_str())
        .filter(|id| *id > current)
        .min()
        .map(str::to_owned)
}

pub(crate) async fn load_league(
    store: &dyn LeagueStore,
    league_id: &str,
) -> Result<LeagueEntity, ServiceError> {
    store
        .find_league(league_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("league `{league_id}` not found")))
}

pub(crate) async fn load_week(
    store: &dyn LeagueStore,
    league_id: &str,
    week_id: &str,
) -> Result<WeekEntity, ServiceError> {
    store.find_week(league_id, week_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("week `{week_id}` not found in league `{league_id}`"))
    })
}

/// Move the league's current week past `from_week_id` when it still points at or before it.
///
/// Returns the new current week when the league document changed.
pub async fn advance_league(
    store: &dyn LeagueStore,
    mut league: LeagueEntity,
    from_week_id: &str,
) -> Result<Option<String>, ServiceError> {
    if league
        .current_week_id
        .as_deref()
        .is_some_and(|current| current > from_week_id)
    {
        return Ok(None);
    }

    let weeks = store.list_weeks(&league.id).await?;
    let Some(next) = next_week_id(&weeks, from_week_id) else {
        debug!(league_id = %league.id, week_id = from_week_id, "no later week to advance to");
        return Ok(None);
    };
    if league.current_week_id.as_deref() == Some(next.as_str()) {
        return Ok(None);
    }

    info!(league_id = %league.id, from = from_week_id, to = %next, "advancing current week");
    league.current_week_id = Some(next.clone());
    store.save_league(league).await?;
    Ok(Some(next))
}

/// Recompute and persist the scores of one week.
///
/// Every roster member and every pick owner receives a score. The week becomes final
/// once it has games and all of them are decided, and a final week advances the league.
/// Running this twice over unchanged data writes identical documents.
pub async fn recompute_week(
    store: &dyn LeagueStore,
    league_id: &str,
    week_id: &str,
    now: OffsetDateTime,
) -> Result<WeekRecomputation, ServiceError> {
    let league = load_league(store, league_id).await?;
    let mut week = load_week(store, league_id, week_id).await?;
    let games = store.list_games(league_id, week_id).await?;
    let picks = store.list_picks(league_id, week_id).await?;

    let settings = ScoringSettings {
        points_per_correct: league.points_per_correct,
    };
    let picks_by_user: BTreeMap<&str, _> = picks
        .iter()
        .map(|pick| (pick.user_id.as_str(), pick))
        .collect();
    let members: BTreeSet<&str> = league
        .members
        .iter()
        .map(String::as_str)
        .chain(picks_by_user.keys().copied())
        .collect();

    let empty = BTreeMap::new();
    let mut scores: Vec<WeekScoreEntity> = members
        .into_iter()
        .map(|user_id| {
            let pick = picks_by_user.get(user_id);
            compute_week_score(
                pick.map_or(&empty, |pick| &pick.selections),
                &games,
                settings,
                week.tiebreaker_event_key.as_deref(),
                pick.and_then(|pick| pick.tiebreaker),
            )
            .into_entity(league_id, week_id, user_id)
        })
        .collect();
    store.save_week_scores(scores.clone()).await?;
    rank_week_scores(&mut scores);

    let all_decided = !games.is_empty() && games.iter().all(|game| game.decided);
    let finalized = all_decided && !week.is_final();
    if finalized {
        week.status = WeekStatus::Final;
        week.finalized_at = Some(now);
        store.save_week(week.clone()).await?;
        info!(league_id, week_id, "week finalized");
    }

    let advanced_to = if week.is_final() {
        advance_league(store, league, week_id).await?
    } else {
        None
    };

    debug!(
        league_id,
        week_id,
        members = scores.len(),
        games = games.len(),
        "week recomputed"
    );

    Ok(WeekRecomputation {
        league_id: league_id.to_owned(),
        week_id: week_id.to_owned(),
        scores,
        status: week.status,
        finalized,
        advanced_to,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use futures::future::BoxFuture;
    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            league_store::memory::MemoryLeagueStore,
            models::{GameEntity, Side, UserPickEntity},
        },
        provider::{ProviderError, ProviderScore, ScoresProvider, ScoresQuery},
        state::{AppState, SharedState},
    };

    const NOW: OffsetDateTime = datetime!(2025-09-07 12:00 UTC);

    pub(crate) struct NoResults;

    impl ScoresProvider for NoResults {
        fn fetch_scores(
            &self,
            _query: ScoresQuery,
        ) -> BoxFuture<'static, Result<Vec<ProviderScore>, ProviderError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    /// App state over [`seeded`] data with a provider that never reports results.
    pub(crate) async fn seeded_state(
        points_per_correct: u32,
    ) -> (SharedState, MemoryLeagueStore) {
        let store = seeded(points_per_correct).await;
        let state = AppState::new(AppConfig::default(), Arc::new(NoResults));
        state.install_league_store(Arc::new(store.clone())).await;
        (state, store)
    }

    pub(crate) fn week(id: &str) -> WeekEntity {
        WeekEntity {
            league_id: "l1".into(),
            id: id.into(),
            deadline: None,
            locked: false,
            tiebreaker_event_key: Some("tb".into()),
            status: WeekStatus::Open,
            finalized_at: None,
            sport_key: None,
        }
    }

    pub(crate) fn game(key: &str, home: Option<i32>, away: Option<i32>) -> GameEntity {
        GameEntity {
            league_id: "l1".into(),
            week_id: "2025-W36".into(),
            event_key: key.into(),
            home: "Home".into(),
            away: "Away".into(),
            start_time: datetime!(2025-09-06 19:30 UTC),
            final_score_home: home,
            final_score_away: away,
            winner: None,
            decided: home.is_some() && away.is_some(),
        }
    }

    /// League `l1` (alice, bob) with weeks W36 and W37. In W36 g1 went home 24-20,
    /// g2 away 10-17, g3 tied 14-14 and the tiebreaker `tb` is still undecided.
    /// Alice picked g1 home, g2 home, g3 away with a tiebreaker of 10.
    pub(crate) async fn seeded(points_per_correct: u32) -> MemoryLeagueStore {
        let store = MemoryLeagueStore::new();
        store
            .save_league(LeagueEntity {
                id: "l1".into(),
                name: "Office".into(),
                current_week_id: Some("2025-W36".into()),
                points_per_correct,
                members: vec!["alice".into(), "bob".into()],
            })
            .await
            .unwrap();
        store.save_week(week("2025-W36")).await.unwrap();
        store.save_week(week("2025-W37")).await.unwrap();
        store
            .save_games(vec![
                game("g1", Some(24), Some(20)),
                game("g2", Some(10), Some(17)),
                game("g3", Some(14), Some(14)),
                game("tb", None, None),
            ])
            .await
            .unwrap();
        let selections: BTreeMap<String, Side> = [
            ("g1".to_string(), Side::Home),
            ("g2".to_string(), Side::Home),
            ("g3".to_string(), Side::Away),
        ]
        .into_iter()
        .collect();
        store
            .save_pick(UserPickEntity {
                league_id: "l1".into(),
                week_id: "2025-W36".into(),
                user_id: "alice".into(),
                selections,
                tiebreaker: Some(10),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn scores_every_member_without_finalizing_partial_week() {
        let store = seeded(1).await;

        let run = recompute_week(&store, "l1", "2025-W36", NOW).await.unwrap();

        assert!(!run.finalized);
        assert_eq!(run.status, WeekStatus::Open);
        assert_eq!(run.advanced_to, None);
        let alice = run.scores.iter().find(|s| s.user_id == "alice").unwrap();
        assert_eq!((alice.correct, alice.points, alice.total), (1, 1, 2));
        let bob = run.scores.iter().find(|s| s.user_id == "bob").unwrap();
        assert_eq!((bob.correct, bob.total), (0, 2));
        assert_eq!(store.list_week_scores("l1", "2025-W36").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn points_follow_league_setting() {
        let store = seeded(3).await;
        let mut tb = game("tb", Some(27), Some(20));
        tb.week_id = "2025-W36".into();
        store.save_games(vec![tb]).await.unwrap();

        let run = recompute_week(&store, "l1", "2025-W36", NOW).await.unwrap();
        let alice = run.scores.iter().find(|s| s.user_id == "alice").unwrap();
        assert_eq!(alice.points, 3);
        assert_eq!(alice.tiebreaker_actual, Some(7));
        assert_eq!(alice.tiebreaker_abs_error, Some(3));
    }

    #[tokio::test]
    async fn finalizes_and_advances_once_all_games_decided() {
        let store = seeded(1).await;
        store
            .save_games(vec![game("tb", Some(27), Some(20))])
            .await
            .unwrap();

        let first = recompute_week(&store, "l1", "2025-W36", NOW).await.unwrap();
        assert!(first.finalized);
        assert_eq!(first.status, WeekStatus::Final);
        assert_eq!(first.advanced_to.as_deref(), Some("2025-W37"));

        let league = store.find_league("l1").await.unwrap().unwrap();
        assert_eq!(league.current_week_id.as_deref(), Some("2025-W37"));
        let stored = store.find_week("l1", "2025-W36").await.unwrap().unwrap();
        assert_eq!(stored.finalized_at, Some(NOW));
    }

    #[tokio::test]
    async fn rerun_writes_identical_documents() {
        let store = seeded(1).await;
        store
            .save_games(vec![game("tb", Some(27), Some(20))])
            .await
            .unwrap();

        recompute_week(&store, "l1", "2025-W36", NOW).await.unwrap();
        let scores = store.list_week_scores("l1", "2025-W36").await.unwrap();
        let week = store.find_week("l1", "2025-W36").await.unwrap();
        let league = store.find_league("l1").await.unwrap();

        let later = datetime!(2025-09-08 12:00 UTC);
        let rerun = recompute_week(&store, "l1", "2025-W36", later).await.unwrap();
        assert!(!rerun.finalized);
        assert_eq!(rerun.advanced_to, None);
        assert_eq!(store.list_week_scores("l1", "2025-W36").await.unwrap(), scores);
        assert_eq!(store.find_week("l1", "2025-W36").await.unwrap(), week);
        assert_eq!(store.find_league("l1").await.unwrap(), league);
    }

    #[tokio::test]
    async fn week_without_games_stays_open() {
        let store = seeded(1).await;

        let run = recompute_week(&store, "l1", "2025-W37", NOW).await.unwrap();
        assert_eq!(run.status, WeekStatus::Open);
        assert!(run.scores.iter().all(|s| s.correct == 0 && s.total == 0));
    }

    #[tokio::test]
    async fn unknown_week_is_not_found() {
        let store = seeded(1).await;
        let err = recompute_week(&store, "l1", "2030-W01", NOW).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn next_week_is_first_later_id() {
        let weeks = vec![week("2025-W38"), week("2025-W36"), week("2025-W37")];
        assert_eq!(next_week_id(&weeks, "2025-W36").as_deref(), Some("2025-W37"));
        assert_eq!(next_week_id(&weeks, "2025-W38"), None);
    }
}
