use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write to collection `{collection}`")]
    Write {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to read from collection `{collection}`")]
    Read {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("malformed document in collection `{collection}`")]
    Decode {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Classify a read failure, separating undecodable documents from I/O errors.
    pub fn read(collection: &'static str, source: MongoError) -> Self {
        if matches!(*source.kind, ErrorKind::BsonDeserialization(_)) {
            MongoDaoError::Decode { collection, source }
        } else {
            MongoDaoError::Read { collection, source }
        }
    }
}
