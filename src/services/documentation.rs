use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Pickem Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::public::get_league,
        crate::routes::public::get_week,
        crate::routes::public::get_week_leaderboard,
        crate::routes::public::get_season_leaderboard,
        crate::routes::public::get_pick_verdicts,
        crate::routes::public::submit_pick,
        crate::routes::admin::upsert_league,
        crate::routes::admin::update_scoring,
        crate::routes::admin::upsert_week,
        crate::routes::admin::recompute_week,
        crate::routes::admin::sync_week,
        crate::routes::admin::simulate_finals,
        crate::routes::admin::set_tiebreaker,
        crate::routes::admin::set_result,
        crate::routes::admin::set_winner,
        crate::routes::admin::incomplete_picks,
        crate::routes::admin::advance_weeks,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::WeekRecomputedEvent,
            crate::dto::sse::SeasonUpdatedEvent,
            crate::dto::public::LeagueView,
            crate::dto::public::WeekView,
            crate::dto::public::GameView,
            crate::dto::public::SubmitPickRequest,
            crate::dto::leaderboard::WeekScoreView,
            crate::dto::leaderboard::WeekLeaderboardResponse,
            crate::dto::leaderboard::SeasonStandingView,
            crate::dto::leaderboard::SeasonLeaderboardResponse,
            crate::dto::leaderboard::PickVerdictsResponse,
            crate::dto::admin::UpsertLeagueRequest,
            crate::dto::admin::UpsertWeekRequest,
            crate::dto::admin::GameInput,
            crate::dto::admin::SyncRequest,
            crate::dto::admin::SetResultRequest,
            crate::dto::admin::SetWinnerRequest,
            crate::dto::admin::SetTiebreakerRequest,
            crate::dto::admin::ScoringSettingsRequest,
            crate::dto::admin::RecomputeResponse,
            crate::dto::admin::AdvanceResponse,
            crate::dto::admin::LeagueAdvance,
            crate::dto::admin::IncompletePicksResponse,
            crate::dao::models::Side,
            crate::dao::models::Winner,
            crate::dao::models::WeekStatus,
            crate::scoring::PickVerdict,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "League, week and leaderboard views"),
        (name = "admin", description = "Seeding, manual results and scoring runs"),
    )
)]
pub struct ApiDoc;
