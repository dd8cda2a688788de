use std::{collections::BTreeMap, sync::Arc};

use futures::future::BoxFuture;
use pickem_back::{
    config::AppConfig,
    dao::{
        league_store::{LeagueStore, memory::MemoryLeagueStore},
        models::{GameEntity, LeagueEntity, Side, UserPickEntity, WeekEntity, WeekStatus, Winner},
    },
    provider::{
        ProviderError, ProviderScore, ProviderTeamScore, RawScore, ScoresProvider, ScoresQuery,
    },
    services::{league_service, results_sync::SyncScope},
    state::{AppState, SharedState},
};
use serde_json::Value;
use time::{OffsetDateTime, macros::datetime};

const CURRENT_WEEK: &str = "2025-W36";
const NEXT_WEEK: &str = "2025-W37";

/// Provider returning the same completed records for every query.
struct FixedProvider(Vec<ProviderScore>);

impl ScoresProvider for FixedProvider {
    fn fetch_scores(
        &self,
        _query: ScoresQuery,
    ) -> BoxFuture<'static, Result<Vec<ProviderScore>, ProviderError>> {
        let scores = self.0.clone();
        Box::pin(async move { Ok(scores) })
    }
}

fn final_score(id: &str, home: (&str, i64), away: (&str, i64)) -> ProviderScore {
    ProviderScore {
        id: id.into(),
        sport_key: Some("americanfootball_ncaaf".into()),
        commence_time: Some("2025-09-06T19:30:00Z".into()),
        completed: true,
        home_team: Some(home.0.into()),
        away_team: Some(away.0.into()),
        scores: Some(vec![
            ProviderTeamScore {
                name: home.0.into(),
                score: Some(RawScore::Text(home.1.to_string())),
            },
            ProviderTeamScore {
                name: away.0.into(),
                score: Some(RawScore::Integer(away.1)),
            },
        ]),
    }
}

fn league(id: &str, current_week_id: Option<&str>, members: &[&str]) -> LeagueEntity {
    LeagueEntity {
        id: id.into(),
        name: format!("League {id}"),
        current_week_id: current_week_id.map(Into::into),
        points_per_correct: 1,
        members: members.iter().map(|member| (*member).into()).collect(),
    }
}

fn week(league_id: &str, id: &str, tiebreaker: Option<&str>) -> WeekEntity {
    WeekEntity {
        league_id: league_id.into(),
        id: id.into(),
        deadline: Some(datetime!(2025-09-06 16:00 UTC)),
        locked: false,
        tiebreaker_event_key: tiebreaker.map(Into::into),
        status: WeekStatus::Open,
        finalized_at: None,
        sport_key: None,
    }
}

fn game(
    league_id: &str,
    event_key: &str,
    home: &str,
    away: &str,
    start: OffsetDateTime,
) -> GameEntity {
    GameEntity {
        league_id: league_id.into(),
        week_id: CURRENT_WEEK.into(),
        event_key: event_key.into(),
        home: home.into(),
        away: away.into(),
        start_time: start,
        final_score_home: None,
        final_score_away: None,
        winner: None,
        decided: false,
    }
}

fn pick(
    league_id: &str,
    user_id: &str,
    selections: &[(&str, Side)],
    tiebreaker: i32,
) -> UserPickEntity {
    UserPickEntity {
        league_id: league_id.into(),
        week_id: CURRENT_WEEK.into(),
        user_id: user_id.into(),
        selections: selections
            .iter()
            .map(|(key, side)| ((*key).to_owned(), *side))
            .collect::<BTreeMap<_, _>>(),
        tiebreaker: Some(tiebreaker),
    }
}

async fn seed_league(store: &MemoryLeagueStore, league_id: &str) {
    store
        .save_league(league(league_id, Some(CURRENT_WEEK), &["alice", "bob", "carol"]))
        .await
        .unwrap();
    store.save_week(week(league_id, CURRENT_WEEK, Some("evt-2"))).await.unwrap();
    store.save_week(week(league_id, NEXT_WEEK, None)).await.unwrap();
    store
        .save_games(vec![
            game(
                league_id,
                "evt-1",
                "Ohio State Buckeyes",
                "Texas Longhorns",
                datetime!(2025-09-06 19:30 UTC),
            ),
            game(
                league_id,
                "evt-2",
                "Michigan Wolverines",
                "Oklahoma Sooners",
                datetime!(2025-09-06 23:00 UTC),
            ),
        ])
        .await
        .unwrap();
    store
        .save_pick(pick(league_id, "alice", &[("evt-1", Side::Home), ("evt-2", Side::Away)], -10))
        .await
        .unwrap();
    store
        .save_pick(pick(league_id, "bob", &[("evt-1", Side::Away), ("evt-2", Side::Away)], 5))
        .await
        .unwrap();
}

fn results() -> Vec<ProviderScore> {
    vec![
        final_score("evt-1", ("Ohio State Buckeyes", 14), ("Texas Longhorns", 7)),
        final_score("evt-2", ("Michigan Wolverines", 10), ("Oklahoma Sooners", 20)),
    ]
}

async fn app_with_store(scores: Vec<ProviderScore>) -> (SharedState, MemoryLeagueStore) {
    let state = AppState::new(AppConfig::default(), Arc::new(FixedProvider(scores)));
    let store = MemoryLeagueStore::new();
    state.install_league_store(Arc::new(store.clone())).await;
    (state, store)
}

#[tokio::test]
async fn synced_results_finalize_score_and_advance_the_league() {
    let (state, store) = app_with_store(results()).await;
    seed_league(&store, "l1").await;
    let mut events = state.public_sse().subscribe();

    let outcome = league_service::refresh_week(&state, "l1", CURRENT_WEEK, Some(SyncScope::Recent))
        .await
        .unwrap();

    let sync = outcome.sync.expect("sync ran");
    assert_eq!(sync.updated, vec!["evt-1".to_owned(), "evt-2".to_owned()]);

    let week = outcome.week;
    assert_eq!(week.status, WeekStatus::Final);
    assert!(week.finalized);
    assert_eq!(week.advanced_to.as_deref(), Some(NEXT_WEEK));

    let ranked: Vec<(&str, u32, Option<u32>)> = week
        .scores
        .iter()
        .map(|score| (score.user_id.as_str(), score.correct, score.tiebreaker_abs_error))
        .collect();
    assert_eq!(
        ranked,
        vec![("alice", 2, Some(0)), ("bob", 1, Some(15)), ("carol", 0, None)]
    );

    let games = store.list_games("l1", CURRENT_WEEK).await.unwrap();
    assert_eq!(games[0].winner, Some(Winner::Home));
    assert_eq!(games[1].winner, Some(Winner::Away));
    assert!(games.iter().all(|game| game.decided));

    let stored_week = store.find_week("l1", CURRENT_WEEK).await.unwrap().unwrap();
    assert!(stored_week.finalized_at.is_some());
    let stored_league = store.find_league("l1").await.unwrap().unwrap();
    assert_eq!(stored_league.current_week_id.as_deref(), Some(NEXT_WEEK));

    assert_eq!(outcome.standings[0].user_id, "alice");
    assert_eq!(outcome.standings[0].points, 2);
    assert_eq!(outcome.standings[0].weeks_played, 1);

    let recomputed = events.recv().await.unwrap();
    assert_eq!(recomputed.event.as_deref(), Some("week.recomputed"));
    let payload: Value = serde_json::from_str(&recomputed.data).unwrap();
    assert_eq!(payload["week_id"], CURRENT_WEEK);
    assert_eq!(payload["finalized"], true);
    assert_eq!(payload["advanced_to"], NEXT_WEEK);

    let season = events.recv().await.unwrap();
    assert_eq!(season.event.as_deref(), Some("season.updated"));
    let payload: Value = serde_json::from_str(&season.data).unwrap();
    assert_eq!(payload["league_id"], "l1");
}

#[tokio::test]
async fn rerunning_the_pipeline_is_idempotent() {
    let (state, store) = app_with_store(results()).await;
    seed_league(&store, "l1").await;

    let first = league_service::refresh_week(&state, "l1", CURRENT_WEEK, Some(SyncScope::Recent))
        .await
        .unwrap();
    let finalized_at = store
        .find_week("l1", CURRENT_WEEK)
        .await
        .unwrap()
        .unwrap()
        .finalized_at;

    let second = league_service::on_game_written(&state, "l1", CURRENT_WEEK)
        .await
        .unwrap();

    assert_eq!(first.week.scores, second.week.scores);
    assert_eq!(first.standings, second.standings);
    assert!(!second.week.finalized);
    assert_eq!(second.week.advanced_to, None);
    let stored = store.find_week("l1", CURRENT_WEEK).await.unwrap().unwrap();
    assert_eq!(stored.finalized_at, finalized_at);
}

#[tokio::test]
async fn poll_isolates_a_failing_league() {
    let (state, store) = app_with_store(results()).await;
    seed_league(&store, "good").await;

    store
        .save_league(league("broken", Some(CURRENT_WEEK), &["dave"]))
        .await
        .unwrap();
    store.save_week(week("broken", CURRENT_WEEK, None)).await.unwrap();
    let mut malformed = game(
        "broken",
        "evt-9",
        "Alabama Crimson Tide",
        "Florida State Seminoles",
        datetime!(2025-09-06 19:30 UTC),
    );
    malformed.decided = true;
    store.save_games(vec![malformed]).await.unwrap();

    store.save_league(league("idle", None, &["erin"])).await.unwrap();

    let report = league_service::poll_all_leagues(&state).await;
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);

    let good = store.find_week("good", CURRENT_WEEK).await.unwrap().unwrap();
    assert_eq!(good.status, WeekStatus::Final);
}

#[tokio::test]
async fn degraded_state_rejects_refresh() {
    let state = AppState::new(AppConfig::default(), Arc::new(FixedProvider(Vec::new())));

    let err = league_service::refresh_week(&state, "l1", CURRENT_WEEK, None)
        .await
        .unwrap_err();
    assert!(matches!(err, pickem_back::error::ServiceError::Degraded));

    let report = league_service::poll_all_leagues(&state).await;
    assert_eq!(report, league_service::PollReport::default());
}
