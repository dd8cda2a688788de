use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the league store and report whether picks and results can be served.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store_reachable = match state.require_league_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "league store did not answer health check");
                false
            }
        },
        Err(_) => {
            warn!("no league store installed (degraded mode)");
            false
        }
    };

    let provider_configured = state.config().provider.api_key.is_some();
    if store_reachable && !state.is_degraded() {
        HealthResponse::ok(provider_configured)
    } else {
        HealthResponse::degraded(store_reachable, provider_configured)
    }
}
