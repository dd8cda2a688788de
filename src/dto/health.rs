use serde::Serialize;
use utoipa::ToSchema;

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" while the league store answers, "degraded" otherwise.
    pub status: String,
    /// Whether the last league store ping succeeded.
    pub store_reachable: bool,
    /// Whether a scores API key is configured.
    pub provider_configured: bool,
}

impl HealthResponse {
    pub fn ok(provider_configured: bool) -> Self {
        Self {
            status: "ok".to_string(),
            store_reachable: true,
            provider_configured,
        }
    }

    /// Leagues cannot be read or written until the store comes back.
    pub fn degraded(store_reachable: bool, provider_configured: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            store_reachable,
            provider_configured,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
