use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{
            AdvanceResponse, IncompletePicksResponse, RecomputeResponse, ScoringSettingsRequest,
            SetResultRequest, SetTiebreakerRequest, SetWinnerRequest, SyncRequest,
            UpsertLeagueRequest, UpsertWeekRequest,
        },
        public::{LeagueView, WeekView},
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for seeding leagues, entering results and running the scoring pipeline.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/leagues/{league_id}", put(upsert_league))
        .route("/admin/leagues/{league_id}/scoring", put(update_scoring))
        .route("/admin/leagues/{league_id}/weeks/{week_id}", put(upsert_week))
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/recompute",
            post(recompute_week),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/sync",
            post(sync_week),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/simulate",
            post(simulate_finals),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/tiebreaker",
            put(set_tiebreaker),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/games/{event_key}/result",
            put(set_result),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/games/{event_key}/winner",
            put(set_winner),
        )
        .route(
            "/admin/leagues/{league_id}/weeks/{week_id}/incomplete-picks",
            get(incomplete_picks),
        )
        .route("/admin/advance", post(advance_weeks))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Create or replace a league.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier")
    ),
    request_body = UpsertLeagueRequest,
    responses((status = 200, description = "League saved", body = LeagueView))
)]
pub async fn upsert_league(
    State(state): State<SharedState>,
    Path(league_id): Path<String>,
    Valid(Json(payload)): Valid<Json<UpsertLeagueRequest>>,
) -> Result<Json<LeagueView>, AppError> {
    Ok(Json(
        admin_service::upsert_league(&state, &league_id, payload).await?,
    ))
}

/// Change the points per correct pick and rescore every week.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}/scoring",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier")
    ),
    request_body = ScoringSettingsRequest,
    responses((status = 200, description = "Settings saved", body = LeagueView))
)]
pub async fn update_scoring(
    State(state): State<SharedState>,
    Path(league_id): Path<String>,
    Valid(Json(payload)): Valid<Json<ScoringSettingsRequest>>,
) -> Result<Json<LeagueView>, AppError> {
    Ok(Json(
        admin_service::update_scoring(&state, &league_id, payload).await?,
    ))
}

/// Create or replace a week and its games.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}/weeks/{week_id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    request_body = UpsertWeekRequest,
    responses(
        (status = 200, description = "Week saved", body = WeekView),
        (status = 409, description = "Selection change not allowed")
    )
)]
pub async fn upsert_week(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<UpsertWeekRequest>>,
) -> Result<Json<WeekView>, AppError> {
    Ok(Json(
        admin_service::upsert_week(&state, &league_id, &week_id, payload).await?,
    ))
}

/// Recompute a week and the season from stored data.
#[utoipa::path(
    post,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/recompute",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    responses((status = 200, description = "Recomputed", body = RecomputeResponse))
)]
pub async fn recompute_week(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::recompute(&state, &league_id, &week_id).await?,
    ))
}

/// Pull results from the scores provider, then recompute.
#[utoipa::path(
    post,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/sync",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    request_body = SyncRequest,
    responses((status = 200, description = "Synced and recomputed", body = RecomputeResponse))
)]
pub async fn sync_week(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::sync(&state, &league_id, &week_id, payload).await?,
    ))
}

/// Fill undecided games with random final scores, then recompute.
#[utoipa::path(
    post,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/simulate",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    responses((status = 200, description = "Simulated and recomputed", body = RecomputeResponse))
)]
pub async fn simulate_finals(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::simulate_finals(&state, &league_id, &week_id).await?,
    ))
}

/// Designate the tiebreaker game of a week.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/tiebreaker",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    request_body = SetTiebreakerRequest,
    responses((status = 200, description = "Tiebreaker set", body = RecomputeResponse))
)]
pub async fn set_tiebreaker(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<SetTiebreakerRequest>>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::set_tiebreaker(&state, &league_id, &week_id, payload).await?,
    ))
}

/// Enter the final score of a game.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/games/{event_key}/result",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`"),
        ("event_key" = String, Path, description = "Game event key")
    ),
    request_body = SetResultRequest,
    responses((status = 200, description = "Result recorded", body = RecomputeResponse))
)]
pub async fn set_result(
    State(state): State<SharedState>,
    Path((league_id, week_id, event_key)): Path<(String, String, String)>,
    Valid(Json(payload)): Valid<Json<SetResultRequest>>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::set_result(&state, &league_id, &week_id, &event_key, payload).await?,
    ))
}

/// Enter the winner of a game without a score.
#[utoipa::path(
    put,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/games/{event_key}/winner",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`"),
        ("event_key" = String, Path, description = "Game event key")
    ),
    request_body = SetWinnerRequest,
    responses((status = 200, description = "Winner recorded", body = RecomputeResponse))
)]
pub async fn set_winner(
    State(state): State<SharedState>,
    Path((league_id, week_id, event_key)): Path<(String, String, String)>,
    Json(payload): Json<SetWinnerRequest>,
) -> Result<Json<RecomputeResponse>, AppError> {
    Ok(Json(
        admin_service::set_winner_only(&state, &league_id, &week_id, &event_key, payload).await?,
    ))
}

/// Members who have not completed their picks.
#[utoipa::path(
    get,
    path = "/admin/leagues/{league_id}/weeks/{week_id}/incomplete-picks",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    responses((status = 200, description = "Members owing picks", body = IncompletePicksResponse))
)]
pub async fn incomplete_picks(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
) -> Result<Json<IncompletePicksResponse>, AppError> {
    Ok(Json(
        admin_service::incomplete_picks(&state, &league_id, &week_id).await?,
    ))
}

/// Run the weekly advance sweep immediately.
#[utoipa::path(
    post,
    path = "/admin/advance",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Leagues advanced", body = AdvanceResponse))
)]
pub async fn advance_weeks(
    State(state): State<SharedState>,
) -> Result<Json<AdvanceResponse>, AppError> {
    Ok(Json(admin_service::advance_weeks(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.config().admin_token.as_deref() {
        Some(token) if token == provided.as_str() => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized("admin access is not configured".into())),
    }
}
