#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{
    GameEntity, LeagueEntity, SeasonStandingEntity, UserPickEntity, WeekEntity, WeekScoreEntity,
};
use crate::dao::storage::{StorageError, StorageResult};

/// Abstraction over the persistence layer for leagues, weeks and their derived scores.
///
/// Every write is a keyed full-document overwrite, so concurrent recomputations of the
/// same week converge on the same persisted state.
pub trait LeagueStore: Send + Sync {
    fn list_leagues(&self) -> BoxFuture<'static, StorageResult<Vec<LeagueEntity>>>;
    fn find_league(&self, league_id: &str)
    -> BoxFuture<'static, StorageResult<Option<LeagueEntity>>>;
    fn save_league(&self, league: LeagueEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Weeks of a league, ordered by week id.
    fn list_weeks(&self, league_id: &str) -> BoxFuture<'static, StorageResult<Vec<WeekEntity>>>;
    fn find_week(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<WeekEntity>>>;
    fn save_week(&self, week: WeekEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Games of a week, ordered by kickoff then event key. Fails on malformed games.
    fn list_games(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>>;

    fn list_picks(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<UserPickEntity>>>;
    fn save_pick(&self, pick: UserPickEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_week_scores(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<WeekScoreEntity>>>;
    fn save_week_scores(
        &self,
        scores: Vec<WeekScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn list_standings(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SeasonStandingEntity>>>;
    fn save_standings(
        &self,
        standings: Vec<SeasonStandingEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Validate games loaded from a backend and put them in the canonical order.
pub(crate) fn checked_games(
    path: &str,
    mut games: Vec<GameEntity>,
) -> StorageResult<Vec<GameEntity>> {
    for game in &games {
        game.validate().map_err(|reason| {
            StorageError::malformed(format!("{path}/{}", game.event_key), reason)
        })?;
    }
    games.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.event_key.cmp(&b.event_key))
    });
    Ok(games)
}
