use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_COLLECTION, LEAGUE_COLLECTION, MongoDocument, PICK_COLLECTION, SCORE_COLLECTION,
        STANDING_COLLECTION, WEEK_COLLECTION, composite_id,
    },
};
use crate::dao::{
    league_store::{LeagueStore, checked_games},
    models::{
        GameEntity, LeagueEntity, SeasonStandingEntity, UserPickEntity, WeekEntity,
        WeekScoreEntity,
    },
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoLeagueStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoLeagueStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let week_scoped = doc! { "league_id": 1, "week_id": 1 };
        let league_scoped = doc! { "league_id": 1 };
        let indexes: [(&'static str, &'static str, &Document); 5] = [
            (WEEK_COLLECTION, "league_id", &league_scoped),
            (GAME_COLLECTION, "league_id,week_id", &week_scoped),
            (PICK_COLLECTION, "league_id,week_id", &week_scoped),
            (SCORE_COLLECTION, "league_id,week_id", &week_scoped),
            (STANDING_COLLECTION, "league_id", &league_scoped),
        ];

        let database = self.database().await;
        for (collection, index, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys.clone())
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_scope_idx")))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T>(&self, name: &'static str) -> Collection<MongoDocument<T>>
    where
        T: Send + Sync,
    {
        let guard = self.inner.state.read().await;
        guard.database.collection::<MongoDocument<T>>(name)
    }

    async fn upsert<T>(&self, name: &'static str, id: String, body: T) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        let document = MongoDocument { id, body };
        self.collection::<T>(name)
            .await
            .replace_one(doc! { "_id": &document.id }, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    async fn find_one<T>(&self, name: &'static str, id: String) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let found = self
            .collection::<T>(name)
            .await
            .find_one(doc! { "_id": id })
            .await
            .map_err(|source| MongoDaoError::read(name, source))?;
        Ok(found.map(|document| document.body))
    }

    async fn find_many<T>(&self, name: &'static str, filter: Document) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let documents: Vec<MongoDocument<T>> = self
            .collection::<T>(name)
            .await
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|source| MongoDaoError::read(name, source))?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::read(name, source))?;
        Ok(documents.into_iter().map(|document| document.body).collect())
    }
}

impl LeagueStore for MongoLeagueStore {
    fn list_leagues(&self) -> BoxFuture<'static, StorageResult<Vec<LeagueEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_many(LEAGUE_COLLECTION, doc! {}).await?) })
    }

    fn find_league(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<LeagueEntity>>> {
        let store = self.clone();
        let id = composite_id(&[league_id]);
        Box::pin(async move { Ok(store.find_one(LEAGUE_COLLECTION, id).await?) })
    }

    fn save_league(&self, league: LeagueEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = composite_id(&[league.id.as_str()]);
            store
                .upsert(LEAGUE_COLLECTION, id, league)
                .await
                .map_err(Into::into)
        })
    }

    fn list_weeks(&self, league_id: &str) -> BoxFuture<'static, StorageResult<Vec<WeekEntity>>> {
        let store = self.clone();
        let filter = doc! { "league_id": league_id };
        Box::pin(async move {
            let mut weeks: Vec<WeekEntity> = store.find_many(WEEK_COLLECTION, filter).await?;
            weeks.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(weeks)
        })
    }

    fn find_week(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<WeekEntity>>> {
        let store = self.clone();
        let id = composite_id(&[league_id, week_id]);
        Box::pin(async move { Ok(store.find_one(WEEK_COLLECTION, id).await?) })
    }

    fn save_week(&self, week: WeekEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = composite_id(&[week.league_id.as_str(), week.id.as_str()]);
            store
                .upsert(WEEK_COLLECTION, id, week)
                .await
                .map_err(Into::into)
        })
    }

    fn list_games(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let path = composite_id(&[GAME_COLLECTION, league_id, week_id]);
        let filter = doc! { "league_id": league_id, "week_id": week_id };
        Box::pin(async move {
            let games = store.find_many(GAME_COLLECTION, filter).await?;
            checked_games(&path, games)
        })
    }

    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for game in games {
                let id = composite_id(&[
                    game.league_id.as_str(),
                    game.week_id.as_str(),
                    game.event_key.as_str(),
                ]);
                store.upsert(GAME_COLLECTION, id, game).await?;
            }
            Ok(())
        })
    }

    fn list_picks(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<UserPickEntity>>> {
        let store = self.clone();
        let filter = doc! { "league_id": league_id, "week_id": week_id };
        Box::pin(async move { Ok(store.find_many(PICK_COLLECTION, filter).await?) })
    }

    fn save_pick(&self, pick: UserPickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = composite_id(&[
                pick.league_id.as_str(),
                pick.week_id.as_str(),
                pick.user_id.as_str(),
            ]);
            store
                .upsert(PICK_COLLECTION, id, pick)
                .await
                .map_err(Into::into)
        })
    }

    fn list_week_scores(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<WeekScoreEntity>>> {
        let store = self.clone();
        let filter = doc! { "league_id": league_id, "week_id": week_id };
        Box::pin(async move { Ok(store.find_many(SCORE_COLLECTION, filter).await?) })
    }

    fn save_week_scores(
        &self,
        scores: Vec<WeekScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for score in scores {
                let id = composite_id(&[
                    score.league_id.as_str(),
                    score.week_id.as_str(),
                    score.user_id.as_str(),
                ]);
                store.upsert(SCORE_COLLECTION, id, score).await?;
            }
            Ok(())
        })
    }

    fn list_standings(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SeasonStandingEntity>>> {
        let store = self.clone();
        let filter = doc! { "league_id": league_id };
        Box::pin(async move { Ok(store.find_many(STANDING_COLLECTION, filter).await?) })
    }

    fn save_standings(
        &self,
        standings: Vec<SeasonStandingEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for standing in standings {
                let id = composite_id(&[standing.league_id.as_str(), standing.user_id.as_str()]);
                store.upsert(STANDING_COLLECTION, id, standing).await?;
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
