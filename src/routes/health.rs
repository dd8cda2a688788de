use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses(
        (status = 200, description = "League store reachable", body = HealthResponse),
        (status = 503, description = "League store missing or not answering", body = HealthResponse)
    )
)]
/// Ping the league store; load balancers see 503 while leagues are unavailable.
pub async fn healthcheck(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let health = health_service::health_status(&state).await;
    let code = if health.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(health))
}

pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        services::recompute_service::tests::{NoResults, seeded_state},
        state::AppState,
    };

    #[tokio::test]
    async fn degraded_service_answers_503() {
        let state = AppState::new(AppConfig::default(), Arc::new(NoResults));

        let (code, Json(body)) = healthcheck(State(state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
    }

    #[tokio::test]
    async fn healthy_service_answers_200() {
        let (state, _store) = seeded_state(1).await;

        let (code, Json(body)) = healthcheck(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }
}
