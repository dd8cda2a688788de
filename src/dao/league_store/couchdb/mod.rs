mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchLeagueStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::MalformedDocument { doc_id, source } => {
                StorageError::malformed(doc_id, source.to_string())
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
