use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        leaderboard::{PickVerdictsResponse, SeasonLeaderboardResponse, WeekLeaderboardResponse},
        public::{LeagueView, SubmitPickRequest, WeekView},
    },
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// League, week and leaderboard views for members.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leagues/{league_id}", get(get_league))
        .route("/leagues/{league_id}/standings", get(get_season_leaderboard))
        .route("/leagues/{league_id}/weeks/{week_id}", get(get_week))
        .route(
            "/leagues/{league_id}/weeks/{week_id}/leaderboard",
            get(get_week_leaderboard),
        )
        .route(
            "/leagues/{league_id}/weeks/{week_id}/picks/{user_id}",
            get(get_pick_verdicts).put(submit_pick),
        )
}

#[utoipa::path(
    get,
    path = "/leagues/{league_id}",
    tag = "public",
    params(("league_id" = String, Path, description = "League identifier")),
    responses(
        (status = 200, description = "League summary", body = LeagueView),
        (status = 404, description = "Unknown league")
    )
)]
/// Fetch a league with its current week.
pub async fn get_league(
    State(state): State<SharedState>,
    Path(league_id): Path<String>,
) -> Result<Json<LeagueView>, AppError> {
    Ok(Json(public_service::league(&state, &league_id).await?))
}

#[utoipa::path(
    get,
    path = "/leagues/{league_id}/weeks/{week_id}",
    tag = "public",
    params(
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    responses(
        (status = 200, description = "Week and its games", body = WeekView),
        (status = 404, description = "Unknown league or week")
    )
)]
/// Fetch a week with its games in kickoff order.
pub async fn get_week(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
) -> Result<Json<WeekView>, AppError> {
    Ok(Json(public_service::week(&state, &league_id, &week_id).await?))
}

#[utoipa::path(
    get,
    path = "/leagues/{league_id}/weeks/{week_id}/leaderboard",
    tag = "public",
    params(
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`")
    ),
    responses((status = 200, description = "Week leaderboard", body = WeekLeaderboardResponse))
)]
/// Week scores, most correct first and closest tiebreaker next.
pub async fn get_week_leaderboard(
    State(state): State<SharedState>,
    Path((league_id, week_id)): Path<(String, String)>,
) -> Result<Json<WeekLeaderboardResponse>, AppError> {
    Ok(Json(
        public_service::week_leaderboard(&state, &league_id, &week_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/leagues/{league_id}/standings",
    tag = "public",
    params(("league_id" = String, Path, description = "League identifier")),
    responses((status = 200, description = "Season leaderboard", body = SeasonLeaderboardResponse))
)]
/// Season standings over final weeks.
pub async fn get_season_leaderboard(
    State(state): State<SharedState>,
    Path(league_id): Path<String>,
) -> Result<Json<SeasonLeaderboardResponse>, AppError> {
    Ok(Json(
        public_service::season_leaderboard(&state, &league_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/leagues/{league_id}/weeks/{week_id}/picks/{user_id}",
    tag = "public",
    params(
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`"),
        ("user_id" = String, Path, description = "Member identifier")
    ),
    responses((status = 200, description = "Verdict per game", body = PickVerdictsResponse))
)]
/// Verdict of each of a member's picks for the week.
pub async fn get_pick_verdicts(
    State(state): State<SharedState>,
    Path((league_id, week_id, user_id)): Path<(String, String, String)>,
) -> Result<Json<PickVerdictsResponse>, AppError> {
    Ok(Json(
        public_service::pick_verdicts(&state, &league_id, &week_id, &user_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/leagues/{league_id}/weeks/{week_id}/picks/{user_id}",
    tag = "public",
    params(
        ("league_id" = String, Path, description = "League identifier"),
        ("week_id" = String, Path, description = "Week identifier, `YYYY-Www`"),
        ("user_id" = String, Path, description = "Member identifier")
    ),
    request_body = SubmitPickRequest,
    responses(
        (status = 200, description = "Picks saved", body = PickVerdictsResponse),
        (status = 409, description = "Picks are locked")
    )
)]
/// Save a member's picks while the week is unlocked.
pub async fn submit_pick(
    State(state): State<SharedState>,
    Path((league_id, week_id, user_id)): Path<(String, String, String)>,
    Valid(Json(payload)): Valid<Json<SubmitPickRequest>>,
) -> Result<Json<PickVerdictsResponse>, AppError> {
    Ok(Json(
        public_service::submit_pick(&state, &league_id, &week_id, &user_id, payload).await?,
    ))
}
