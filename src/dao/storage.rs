use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored document decoded but breaks an entity invariant.
    #[error("malformed document `{path}`: {reason}")]
    Malformed { path: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a malformed-document error for the given storage path.
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
