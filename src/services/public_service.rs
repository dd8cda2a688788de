//! Read-only views of leagues, weeks and leaderboards, plus pick submission.

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    dao::models::UserPickEntity,
    dto::{
        format_week_label,
        leaderboard::{
            PickVerdictsResponse, SeasonLeaderboardResponse, WeekLeaderboardResponse,
            season_standing_views, week_score_views,
        },
        public::{LeagueView, SubmitPickRequest, WeekView},
    },
    error::ServiceError,
    scoring::{pick_verdict, rank_standings, rank_week_scores},
    services::recompute_service::{load_league, load_week},
    state::SharedState,
};

/// League summary.
pub async fn league(state: &SharedState, league_id: &str) -> Result<LeagueView, ServiceError> {
    let store = state.require_league_store().await?;
    Ok(load_league(store.as_ref(), league_id).await?.into())
}

/// A week with its games.
pub async fn week(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<WeekView, ServiceError> {
    let store = state.require_league_store().await?;
    let week = load_week(store.as_ref(), league_id, week_id).await?;
    let games = store.list_games(league_id, week_id).await?;
    Ok(WeekView::new(week, games, OffsetDateTime::now_utc()))
}

/// Stored week scores in leaderboard order.
pub async fn week_leaderboard(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
) -> Result<WeekLeaderboardResponse, ServiceError> {
    let store = state.require_league_store().await?;
    let week = load_week(store.as_ref(), league_id, week_id).await?;
    let mut scores = store.list_week_scores(league_id, week_id).await?;
    rank_week_scores(&mut scores);

    Ok(WeekLeaderboardResponse {
        league_id: league_id.to_owned(),
        week_label: format_week_label(week_id),
        week_id: week_id.to_owned(),
        status: week.status,
        scores: week_score_views(&scores),
    })
}

/// Stored season standings in ranking order.
pub async fn season_leaderboard(
    state: &SharedState,
    league_id: &str,
) -> Result<SeasonLeaderboardResponse, ServiceError> {
    let store = state.require_league_store().await?;
    load_league(store.as_ref(), league_id).await?;
    let mut standings = store.list_standings(league_id).await?;
    rank_standings(&mut standings);

    Ok(SeasonLeaderboardResponse {
        league_id: league_id.to_owned(),
        standings: season_standing_views(&standings),
    })
}

/// Verdict of each game of the week for one user, in kickoff order.
pub async fn pick_verdicts(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    user_id: &str,
) -> Result<PickVerdictsResponse, ServiceError> {
    let store = state.require_league_store().await?;
    load_week(store.as_ref(), league_id, week_id).await?;
    let games = store.list_games(league_id, week_id).await?;
    let pick = store
        .list_picks(league_id, week_id)
        .await?
        .into_iter()
        .find(|pick| pick.user_id == user_id);

    let verdicts: IndexMap<String, _> = games
        .iter()
        .map(|game| {
            let side = pick
                .as_ref()
                .and_then(|pick| pick.selections.get(&game.event_key).copied());
            (game.event_key.clone(), pick_verdict(side, game))
        })
        .collect();

    Ok(PickVerdictsResponse {
        league_id: league_id.to_owned(),
        week_id: week_id.to_owned(),
        user_id: user_id.to_owned(),
        tiebreaker: pick.and_then(|pick| pick.tiebreaker),
        verdicts,
    })
}

/// Store a user's picks, replacing any earlier submission, while the week is unlocked.
pub async fn submit_pick(
    state: &SharedState,
    league_id: &str,
    week_id: &str,
    user_id: &str,
    request: SubmitPickRequest,
) -> Result<PickVerdictsResponse, ServiceError> {
    let store = state.require_league_store().await?;
    load_league(store.as_ref(), league_id).await?;
    let week = load_week(store.as_ref(), league_id, week_id).await?;
    if week.is_final() || week.picks_locked(OffsetDateTime::now_utc()) {
        return Err(ServiceError::InvalidState(format!(
            "picks for week `{week_id}` are locked"
        )));
    }

    let games = store.list_games(league_id, week_id).await?;
    if let Some(unknown) = request
        .selections
        .keys()
        .find(|key| !games.iter().any(|game| &game.event_key == *key))
    {
        return Err(ServiceError::InvalidInput(format!(
            "game `{unknown}` is not part of week `{week_id}`"
        )));
    }

    store
        .save_pick(UserPickEntity {
            league_id: league_id.to_owned(),
            week_id: week_id.to_owned(),
            user_id: user_id.to_owned(),
            selections: request.selections,
            tiebreaker: request.tiebreaker,
        })
        .await?;
    info!(league_id, week_id, user_id, "picks saved");

    pick_verdicts(state, league_id, week_id, user_id).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use time::macros::datetime;

    use super::*;
    use crate::{
        dao::{
            league_store::LeagueStore,
            models::{Side, WeekEntity, WeekStatus},
        },
        scoring::PickVerdict,
        services::{league_service, recompute_service::tests::seeded_state},
    };

    const WEEK: &str = "2025-W36";

    fn request(selections: &[(&str, Side)], tiebreaker: Option<i32>) -> SubmitPickRequest {
        SubmitPickRequest {
            selections: selections
                .iter()
                .map(|(key, side)| ((*key).to_owned(), *side))
                .collect::<BTreeMap<_, _>>(),
            tiebreaker,
        }
    }

    #[tokio::test]
    async fn submitted_picks_come_back_as_verdicts() {
        let (state, store) = seeded_state(1).await;

        let response = submit_pick(
            &state,
            "l1",
            WEEK,
            "bob",
            request(&[("g1", Side::Away), ("tb", Side::Home)], Some(-3)),
        )
        .await
        .unwrap();

        assert_eq!(response.tiebreaker, Some(-3));
        let verdicts: Vec<(&str, PickVerdict)> = response
            .verdicts
            .iter()
            .map(|(key, verdict)| (key.as_str(), *verdict))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                ("g1", PickVerdict::Incorrect),
                ("g2", PickVerdict::Pending),
                ("g3", PickVerdict::Tie),
                ("tb", PickVerdict::Pending),
            ]
        );
        let picks = store.list_picks("l1", WEEK).await.unwrap();
        assert!(picks.iter().any(|pick| pick.user_id == "bob"));
    }

    async fn rejected_after(
        state: &SharedState,
        store: &dyn LeagueStore,
        edit: fn(&mut WeekEntity),
    ) {
        let mut week = store.find_week("l1", WEEK).await.unwrap().unwrap();
        edit(&mut week);
        store.save_week(week).await.unwrap();

        let err = submit_pick(state, "l1", WEEK, "bob", request(&[("g1", Side::Home)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn locked_week_rejects_picks() {
        let (state, store) = seeded_state(1).await;
        rejected_after(&state, &store, |week| week.locked = true).await;
    }

    #[tokio::test]
    async fn passed_deadline_rejects_picks() {
        let (state, store) = seeded_state(1).await;
        rejected_after(&state, &store, |week| {
            week.deadline = Some(datetime!(2025-09-06 16:00 UTC));
        })
        .await;
    }

    #[tokio::test]
    async fn final_week_rejects_picks() {
        let (state, store) = seeded_state(1).await;
        rejected_after(&state, &store, |week| week.status = WeekStatus::Final).await;
    }

    #[tokio::test]
    async fn picks_must_name_games_of_the_week() {
        let (state, _store) = seeded_state(1).await;

        let err = submit_pick(&state, "l1", WEEK, "bob", request(&[("g9", Side::Home)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn week_leaderboard_is_ranked() {
        let (state, _store) = seeded_state(1).await;
        league_service::on_game_written(&state, "l1", WEEK).await.unwrap();

        let board = week_leaderboard(&state, "l1", WEEK).await.unwrap();
        assert_eq!(board.week_label, "Week 36 (2025)");
        let order: Vec<(usize, &str, u32)> = board
            .scores
            .iter()
            .map(|score| (score.rank, score.user_id.as_str(), score.correct))
            .collect();
        assert_eq!(order, vec![(1, "alice", 1), (2, "bob", 0)]);
    }

    #[tokio::test]
    async fn unknown_league_is_not_found() {
        let (state, _store) = seeded_state(1).await;
        let err = league(&state, "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
