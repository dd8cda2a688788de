//! Third-party final scores feed.

mod error;
mod models;
mod odds_api;

use futures::future::BoxFuture;

pub use error::ProviderError;
pub use models::{ProviderScore, ProviderTeamScore, RawScore};
pub use odds_api::OddsApiClient;

/// Parameters of one scores request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoresQuery {
    pub sport_key: String,
    /// How many days of completed games to include.
    pub days_from: Option<u32>,
    /// Restrict the response to these provider event ids.
    pub event_ids: Vec<String>,
}

/// Source of completed game scores. Responses are untrusted and may be empty.
pub trait ScoresProvider: Send + Sync {
    fn fetch_scores(
        &self,
        query: ScoresQuery,
    ) -> BoxFuture<'static, Result<Vec<ProviderScore>, ProviderError>>;
}

/// Map a local event key to the provider id it was created from.
///
/// Keys may carry a `:suffix` added locally; only the part before it is sent upstream.
pub fn provider_event_id(event_key: &str) -> Option<&str> {
    let id = event_key.split(':').next().unwrap_or_default().trim();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::provider_event_id;

    #[test]
    fn event_ids_drop_local_suffixes() {
        assert_eq!(provider_event_id("abc123:1"), Some("abc123"));
        assert_eq!(provider_event_id(" abc123 "), Some("abc123"));
        assert_eq!(provider_event_id(":manual"), None);
    }
}
