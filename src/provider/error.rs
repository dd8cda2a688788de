use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the scores provider. Callers treat all of them as "no data".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("scores provider API key is not configured")]
    MissingApiKey,
    #[error("failed to build scores provider client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to reach scores provider at `{url}`")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("scores provider answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode scores provider response")]
    Decode {
        #[source]
        source: reqwest::Error,
    },
}
