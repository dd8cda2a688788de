use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";
/// League database used when `MONGO_DB` is unset or blank.
pub const DEFAULT_DATABASE: &str = "pickem";
const APP_NAME: &str = "pickem-back";

/// Connection settings of the MongoDB league store.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
            .to_owned();
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri =
            std::env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let db = std::env::var(DB_ENV).ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_database_falls_back_to_default() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some("  "))
            .await
            .unwrap();
        assert_eq!(config.database_name, DEFAULT_DATABASE);
        assert_eq!(config.options.app_name.as_deref(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn explicit_database_and_app_name_are_kept() {
        let config =
            MongoConfig::from_uri("mongodb://localhost:27017/?appName=ops", Some("league_2025"))
                .await
                .unwrap();
        assert_eq!(config.database_name, "league_2025");
        assert_eq!(config.options.app_name.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn non_mongo_uri_is_rejected() {
        let Err(err) = MongoConfig::from_uri("http://localhost:5984", None).await else {
            panic!("http uri accepted");
        };
        assert!(matches!(
            err,
            MongoDaoError::InvalidUri { ref uri, .. } if uri.starts_with("http")
        ));
    }
}
