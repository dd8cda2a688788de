use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::ProviderConfig;

use super::{ProviderError, ProviderScore, ScoresProvider, ScoresQuery, provider_event_id};

/// Client for The Odds API v4 scores endpoint.
#[derive(Clone)]
pub struct OddsApiClient {
    client: Client,
    base_url: Arc<str>,
    api_key: Option<Arc<str>>,
}

impl OddsApiClient {
    /// Build a client with the configured base URL, timeout and API key.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pickem-back/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ProviderError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            api_key: config.api_key.as_deref().map(Arc::from),
        })
    }

    fn scores_url(&self, sport_key: &str) -> String {
        format!("{}/sports/{}/scores", self.base_url, sport_key)
    }

    async fn request(
        &self,
        api_key: &str,
        query: &ScoresQuery,
        with_days_from: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.scores_url(&query.sport_key);
        let mut params: Vec<(&str, String)> = vec![
            ("apiKey", api_key.to_owned()),
            ("dateFormat", "iso".to_owned()),
        ];
        if let Some(days) = query.days_from.filter(|_| with_days_from) {
            params.push(("daysFrom", days.to_string()));
        }
        params.extend(
            query
                .event_ids
                .iter()
                .filter_map(|id| provider_event_id(id))
                .map(|id| ("eventIds", id.to_owned())),
        );

        self.client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|source| ProviderError::Network { url, source })
    }

    async fn fetch(&self, query: ScoresQuery) -> Result<Vec<ProviderScore>, ProviderError> {
        let api_key = self.api_key.clone().ok_or(ProviderError::MissingApiKey)?;

        let mut response = self.request(&api_key, &query, true).await?;
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY
            && query.days_from.is_some()
            && !query.event_ids.is_empty()
        {
            warn!(
                sport = %query.sport_key,
                "scores provider rejected eventIds with daysFrom; retrying without daysFrom"
            );
            response = self.request(&api_key, &query, false).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let scores = response
            .json::<Vec<ProviderScore>>()
            .await
            .map_err(|source| ProviderError::Decode { source })?;
        debug!(sport = %query.sport_key, count = scores.len(), "fetched provider scores");
        Ok(scores)
    }
}

impl ScoresProvider for OddsApiClient {
    fn fetch_scores(
        &self,
        query: ScoresQuery,
    ) -> BoxFuture<'static, Result<Vec<ProviderScore>, ProviderError>> {
        let client = self.clone();
        Box::pin(async move { client.fetch(query).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sport_scores_url() {
        let client = OddsApiClient::new(&ProviderConfig {
            base_url: "https://example.test/v4/".into(),
            ..ProviderConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.scores_url("americanfootball_ncaaf"),
            "https://example.test/v4/sports/americanfootball_ncaaf/scores"
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OddsApiClient::new(&ProviderConfig::default()).unwrap();
        let err = client
            .fetch_scores(ScoresQuery {
                sport_key: "americanfootball_ncaaf".into(),
                days_from: Some(3),
                event_ids: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
