use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    league_store::{LeagueStore, checked_games},
    models::{
        GameEntity, LeagueEntity, SeasonStandingEntity, UserPickEntity, WeekEntity,
        WeekScoreEntity,
    },
    storage::StorageResult,
};

type PairKey = (String, String);
type WeekRowKey = (String, String, String);

/// Process-local store used for development and tests.
#[derive(Clone, Default)]
pub struct MemoryLeagueStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    leagues: DashMap<String, LeagueEntity>,
    weeks: DashMap<PairKey, WeekEntity>,
    games: DashMap<WeekRowKey, GameEntity>,
    picks: DashMap<WeekRowKey, UserPickEntity>,
    scores: DashMap<WeekRowKey, WeekScoreEntity>,
    standings: DashMap<PairKey, SeasonStandingEntity>,
}

impl MemoryLeagueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn collect_week<V: Clone>(
    map: &DashMap<WeekRowKey, V>,
    league_id: &str,
    week_id: &str,
) -> Vec<(String, V)> {
    let mut rows: Vec<(String, V)> = map
        .iter()
        .filter(|entry| entry.key().0 == league_id && entry.key().1 == week_id)
        .map(|entry| (entry.key().2.clone(), entry.value().clone()))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

impl LeagueStore for MemoryLeagueStore {
    fn list_leagues(&self) -> BoxFuture<'static, StorageResult<Vec<LeagueEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut leagues: Vec<LeagueEntity> = store
                .inner
                .leagues
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            leagues.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(leagues)
        })
    }

    fn find_league(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<LeagueEntity>>> {
        let found = self
            .inner
            .leagues
            .get(league_id)
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn save_league(&self, league: LeagueEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.leagues.insert(league.id.clone(), league);
            Ok(())
        })
    }

    fn list_weeks(&self, league_id: &str) -> BoxFuture<'static, StorageResult<Vec<WeekEntity>>> {
        let mut weeks: Vec<WeekEntity> = self
            .inner
            .weeks
            .iter()
            .filter(|entry| entry.key().0 == league_id)
            .map(|entry| entry.value().clone())
            .collect();
        weeks.sort_by(|a, b| a.id.cmp(&b.id));
        Box::pin(async move { Ok(weeks) })
    }

    fn find_week(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<WeekEntity>>> {
        let found = self
            .inner
            .weeks
            .get(&(league_id.to_owned(), week_id.to_owned()))
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn save_week(&self, week: WeekEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .weeks
                .insert((week.league_id.clone(), week.id.clone()), week);
            Ok(())
        })
    }

    fn list_games(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let path = format!("{league_id}/{week_id}");
        let games = collect_week(&self.inner.games, league_id, week_id)
            .into_iter()
            .map(|(_, game)| game)
            .collect();
        Box::pin(async move { checked_games(&path, games) })
    }

    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for game in games {
                let key = (
                    game.league_id.clone(),
                    game.week_id.clone(),
                    game.event_key.clone(),
                );
                store.inner.games.insert(key, game);
            }
            Ok(())
        })
    }

    fn list_picks(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<UserPickEntity>>> {
        let picks = collect_week(&self.inner.picks, league_id, week_id)
            .into_iter()
            .map(|(_, pick)| pick)
            .collect();
        Box::pin(async move { Ok(picks) })
    }

    fn save_pick(&self, pick: UserPickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = (
                pick.league_id.clone(),
                pick.week_id.clone(),
                pick.user_id.clone(),
            );
            store.inner.picks.insert(key, pick);
            Ok(())
        })
    }

    fn list_week_scores(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<WeekScoreEntity>>> {
        let scores = collect_week(&self.inner.scores, league_id, week_id)
            .into_iter()
            .map(|(_, score)| score)
            .collect();
        Box::pin(async move { Ok(scores) })
    }

    fn save_week_scores(
        &self,
        scores: Vec<WeekScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for score in scores {
                let key = (
                    score.league_id.clone(),
                    score.week_id.clone(),
                    score.user_id.clone(),
                );
                store.inner.scores.insert(key, score);
            }
            Ok(())
        })
    }

    fn list_standings(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SeasonStandingEntity>>> {
        let mut standings: Vec<SeasonStandingEntity> = self
            .inner
            .standings
            .iter()
            .filter(|entry| entry.key().0 == league_id)
            .map(|entry| entry.value().clone())
            .collect();
        standings.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Box::pin(async move { Ok(standings) })
    }

    fn save_standings(
        &self,
        standings: Vec<SeasonStandingEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for standing in standings {
                let key = (standing.league_id.clone(), standing.user_id.clone());
                store.inner.standings.insert(key, standing);
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use super::*;
    use crate::dao::{
        models::{Winner, WeekStatus},
        storage::StorageError,
    };

    fn game(event_key: &str, hour: i64) -> GameEntity {
        GameEntity {
            league_id: "l1".into(),
            week_id: "2025-W36".into(),
            event_key: event_key.into(),
            home: "Ohio State".into(),
            away: "Texas".into(),
            start_time: datetime!(2025-09-06 00:00 UTC) + Duration::hours(hour),
            final_score_home: None,
            final_score_away: None,
            winner: None,
            decided: false,
        }
    }

    #[tokio::test]
    async fn games_come_back_in_kickoff_order() {
        let store = MemoryLeagueStore::new();
        store
            .save_games(vec![game("b", 20), game("a", 20), game("c", 12)])
            .await
            .unwrap();

        let games = store.list_games("l1", "2025-W36").await.unwrap();
        let keys: Vec<&str> = games.iter().map(|g| g.event_key.as_str()).collect();
        assert_eq!(keys, ["c", "a", "b"]);
        assert!(store.list_games("l1", "2025-W37").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_games_are_rejected_on_load() {
        let store = MemoryLeagueStore::new();
        let mut broken = game("x", 18);
        broken.final_score_home = Some(21);
        broken.final_score_away = Some(14);
        broken.winner = Some(Winner::Away);
        broken.decided = true;
        store.save_games(vec![broken]).await.unwrap();

        let err = store.list_games("l1", "2025-W36").await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { ref path, .. } if path == "l1/2025-W36/x"));
    }

    #[tokio::test]
    async fn writes_overwrite_by_key() {
        let store = MemoryLeagueStore::new();
        let mut week = WeekEntity {
            league_id: "l1".into(),
            id: "2025-W36".into(),
            deadline: None,
            locked: false,
            tiebreaker_event_key: None,
            status: WeekStatus::Open,
            finalized_at: None,
            sport_key: None,
        };
        store.save_week(week.clone()).await.unwrap();
        week.status = WeekStatus::Final;
        store.save_week(week.clone()).await.unwrap();

        let weeks = store.list_weeks("l1").await.unwrap();
        assert_eq!(weeks, vec![week]);
    }
}
