//! Failures of the CouchDB-backed league store.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for CouchDB league store calls.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Step of the startup database check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStep {
    Lookup,
    Create,
}

impl std::fmt::Display for DatabaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatabaseStep::Lookup => "look up",
            DatabaseStep::Create => "create",
        })
    }
}

#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("league store setting `{var}` is not set")]
    MissingEnvVar { var: &'static str },
    #[error("`{url}` cannot address a CouchDB database")]
    InvalidBaseUrl { url: String },
    #[error("failed to build the CouchDB HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    #[error("could not {step} league database `{database}`")]
    Database {
        database: String,
        step: DatabaseStep,
        #[source]
        source: reqwest::Error,
    },
    #[error("league database `{database}` answered {status}")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    #[error("CouchDB request for `{doc_id}` was not sent")]
    RequestSend {
        doc_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{doc_id}`")]
    RequestStatus { doc_id: String, status: StatusCode },
    /// Another writer replaced the document between the revision read and the write.
    #[error("revision conflict while writing `{doc_id}`")]
    RevisionConflict { doc_id: String },
    #[error("CouchDB response for `{doc_id}` is not JSON")]
    DecodeResponse {
        doc_id: String,
        #[source]
        source: reqwest::Error,
    },
    /// Document body does not decode into its league entity.
    #[error("league document `{doc_id}` does not match its entity")]
    MalformedDocument {
        doc_id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;

    #[test]
    fn undecodable_documents_are_malformed() {
        let source = serde_json::from_str::<u32>("\"seven\"").unwrap_err();
        let err: StorageError = CouchDaoError::MalformedDocument {
            doc_id: "game::l1::2025-W36::g1".into(),
            source,
        }
        .into();
        let StorageError::Malformed { path, .. } = err else {
            panic!("expected a malformed document, got {err:?}");
        };
        assert_eq!(path, "game::l1::2025-W36::g1");
    }

    #[test]
    fn server_failures_leave_store_unavailable() {
        let err: StorageError = CouchDaoError::RevisionConflict {
            doc_id: "league::l1".into(),
        }
        .into();
        assert!(matches!(err, StorageError::Unavailable { .. }));

        let err: StorageError = CouchDaoError::DatabaseStatus {
            database: "pickem".into(),
            status: StatusCode::UNAUTHORIZED,
        }
        .into();
        assert!(err.to_string().contains("league database `pickem` answered 401"));
    }
}
