use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use tracing::debug;

use crate::dao::{
    league_store::{LeagueStore, checked_games},
    models::{
        GameEntity, LeagueEntity, SeasonStandingEntity, UserPickEntity, WeekEntity,
        WeekScoreEntity,
    },
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult, DatabaseStep},
    models::{
        AllDocsResponse, CouchDocument, END_SUFFIX, GAME_PREFIX, LEAGUE_PREFIX, PICK_PREFIX,
        RevisionOnly, SCORE_PREFIX, game_doc_id, league_doc_id, pick_doc_id, score_doc_id,
        standing_doc_id, standing_prefix, week_doc_id, week_prefix, week_scoped_prefix,
    },
};

const ALL_DOCS: &str = "_all_docs";
/// Writes tried per document before a revision conflict is reported.
const UPSERT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct CouchLeagueStore {
    client: Client,
    base_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchLeagueStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| CouchDaoError::InvalidBaseUrl {
                url: config.base_url.clone(),
            })?;
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url: Arc::new(base_url),
            database: Arc::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn url(&self, path: Option<&str>) -> Url {
        let mut url = (*self.base_url).clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.database);
            if let Some(path) = path {
                segments.push(path);
            }
        }
        url
    }

    fn request(&self, method: Method, path: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let response = self
            .request(Method::GET, None)
            .send()
            .await
            .map_err(|source| CouchDaoError::Database {
                database: database.clone(),
                step: DatabaseStep::Lookup,
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .request(Method::PUT, None)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Database {
                        database: database.clone(),
                        step: DatabaseStep::Create,
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, Some(doc_id))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                doc_id: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response.json::<Value>().await.map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        doc_id: doc_id.to_string(),
                        source,
                    }
                })?;
                from_value(value)
                    .map(Some)
                    .map_err(|source| CouchDaoError::MalformedDocument {
                        doc_id: doc_id.to_string(),
                        source,
                    })
            }
            other => Err(CouchDaoError::RequestStatus {
                doc_id: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, Some(doc_id))
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                doc_id: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                doc_id: doc_id.to_string(),
            }),
            status => Err(CouchDaoError::RequestStatus {
                doc_id: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Overwrite `doc_id` with `body`, carrying over the current revision if any.
    ///
    /// A write that loses a revision race is retried against the fresh revision, so
    /// concurrent recomputations still end on a full overwrite.
    async fn upsert<T>(&self, doc_id: String, body: T) -> CouchResult<()>
    where
        T: Serialize,
    {
        let mut document = CouchDocument {
            id: doc_id,
            rev: None,
            body,
        };
        let mut attempt = 1;
        loop {
            document.rev = self
                .get_document::<RevisionOnly>(&document.id)
                .await?
                .and_then(|existing| existing.rev);
            match self.put_document(&document.id, &document).await {
                Err(CouchDaoError::RevisionConflict { .. }) if attempt < UPSERT_ATTEMPTS => {
                    debug!(doc_id = %document.id, attempt, "revision conflict; retrying write");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn find_entity<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self
            .get_document::<CouchDocument<T>>(doc_id)
            .await?
            .map(|doc| doc.body))
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, Some(ALL_DOCS))
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                doc_id: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                doc_id: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                doc_id: ALL_DOCS.to_string(),
                source,
            }
        })?;

        debug!(prefix, rows = payload.rows.len(), "listed CouchDB documents");

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| (row.id, doc)))
            .map(|(id, doc)| {
                from_value::<CouchDocument<T>>(doc)
                    .map(|doc| doc.body)
                    .map_err(|source| CouchDaoError::MalformedDocument { doc_id: id, source })
            })
            .collect()
    }
}

impl LeagueStore for CouchLeagueStore {
    fn list_leagues(&self) -> BoxFuture<'static, StorageResult<Vec<LeagueEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .list_documents::<LeagueEntity>(LEAGUE_PREFIX)
                .await?)
        })
    }

    fn find_league(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<LeagueEntity>>> {
        let store = self.clone();
        let doc_id = league_doc_id(league_id);
        Box::pin(async move { Ok(store.find_entity(&doc_id).await?) })
    }

    fn save_league(&self, league: LeagueEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = league_doc_id(&league.id);
            store.upsert(doc_id, league).await.map_err(Into::into)
        })
    }

    fn list_weeks(&self, league_id: &str) -> BoxFuture<'static, StorageResult<Vec<WeekEntity>>> {
        let store = self.clone();
        let prefix = week_prefix(league_id);
        Box::pin(async move {
            let mut weeks = store.list_documents::<WeekEntity>(&prefix).await?;
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
        let doc_id = week_doc_id(league_id, week_id);
        Box::pin(async move { Ok(store.find_entity(&doc_id).await?) })
    }

    fn save_week(&self, week: WeekEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = week_doc_id(&week.league_id, &week.id);
            store.upsert(doc_id, week).await.map_err(Into::into)
        })
    }

    fn list_games(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        let prefix = week_scoped_prefix(GAME_PREFIX, league_id, week_id);
        Box::pin(async move {
            let games = store.list_documents::<GameEntity>(&prefix).await?;
            checked_games(&prefix, games)
        })
    }

    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for game in games {
                let doc_id = game_doc_id(&game.league_id, &game.week_id, &game.event_key);
                store.upsert(doc_id, game).await?;
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
        let prefix = week_scoped_prefix(PICK_PREFIX, league_id, week_id);
        Box::pin(async move { Ok(store.list_documents(&prefix).await?) })
    }

    fn save_pick(&self, pick: UserPickEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = pick_doc_id(&pick.league_id, &pick.week_id, &pick.user_id);
            store.upsert(doc_id, pick).await.map_err(Into::into)
        })
    }

    fn list_week_scores(
        &self,
        league_id: &str,
        week_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<WeekScoreEntity>>> {
        let store = self.clone();
        let prefix = week_scoped_prefix(SCORE_PREFIX, league_id, week_id);
        Box::pin(async move { Ok(store.list_documents(&prefix).await?) })
    }

    fn save_week_scores(
        &self,
        scores: Vec<WeekScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for score in scores {
                let doc_id = score_doc_id(&score.league_id, &score.week_id, &score.user_id);
                store.upsert(doc_id, score).await?;
            }
            Ok(())
        })
    }

    fn list_standings(
        &self,
        league_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SeasonStandingEntity>>> {
        let store = self.clone();
        let prefix = standing_prefix(league_id);
        Box::pin(async move { Ok(store.list_documents(&prefix).await?) })
    }

    fn save_standings(
        &self,
        standings: Vec<SeasonStandingEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for standing in standings {
                let doc_id = standing_doc_id(&standing.league_id, &standing.user_id);
                store.upsert(doc_id, standing).await?;
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let path = store.database.to_string();
            let response = store
                .request(Method::GET, None)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    doc_id: path.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    doc_id: path,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
