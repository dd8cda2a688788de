//! Season standings: sums of week scores over final weeks.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{SeasonStandingEntity, WeekScoreEntity},
    },
    error::ServiceError,
    scoring::rank_standings,
};

/// Sum week scores into one standing per user.
///
/// Callers pass only the scores of final weeks.
pub fn aggregate_season<'a>(
    league_id: &str,
    scores: impl IntoIterator<Item = &'a WeekScoreEntity>,
) -> Vec<SeasonStandingEntity> {
    let mut by_user: BTreeMap<&str, SeasonStandingEntity> = BTreeMap::new();
    for score in scores {
        let entry = by_user
            .entry(score.user_id.as_str())
            .or_insert_with(|| SeasonStandingEntity {
                league_id: league_id.to_owned(),
                user_id: score.user_id.clone(),
                correct: 0,
                total: 0,
                points: 0,
                weeks_played: 0,
            });
        entry.correct = entry.correct.saturating_add(score.correct);
        entry.total = entry.total.saturating_add(score.total);
        entry.points = entry.points.saturating_add(score.points);
        entry.weeks_played += 1;
    }
    by_user.into_values().collect()
}

/// Rebuild and persist the league's season standings, returned in ranking order.
pub async fn recompute_season(
    store: &dyn LeagueStore,
    league_id: &str,
) -> Result<Vec<SeasonStandingEntity>, ServiceError> {
    let weeks = store.list_weeks(league_id).await?;
    let mut scores = Vec::new();
    for week in weeks.iter().filter(|week| week.is_final()) {
        scores.extend(store.list_week_scores(league_id, &week.id).await?);
    }

    let mut standings = aggregate_season(league_id, &scores);
    store.save_standings(standings.clone()).await?;
    rank_standings(&mut standings);

    debug!(
        league_id,
        final_weeks = weeks.iter().filter(|week| week.is_final()).count(),
        users = standings.len(),
        "season standings recomputed"
    );
    Ok(standings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        league_store::memory::MemoryLeagueStore,
        models::{WeekEntity, WeekStatus},
    };

    fn score(week_id: &str, user_id: &str, correct: u32, total: u32) -> WeekScoreEntity {
        WeekScoreEntity {
            league_id: "l1".into(),
            week_id: week_id.into(),
            user_id: user_id.into(),
            correct,
            total,
            points: correct * 2,
            tiebreaker_prediction: None,
            tiebreaker_actual: None,
            tiebreaker_abs_error: None,
        }
    }

    fn week(id: &str, status: WeekStatus) -> WeekEntity {
        WeekEntity {
            league_id: "l1".into(),
            id: id.into(),
            deadline: None,
            locked: false,
            tiebreaker_event_key: None,
            status,
            finalized_at: None,
            sport_key: None,
        }
    }

    #[test]
    fn sums_per_user() {
        let scores = vec![
            score("2025-W36", "alice", 4, 6),
            score("2025-W37", "alice", 3, 5),
            score("2025-W36", "bob", 6, 6),
        ];
        let standings = aggregate_season("l1", &scores);

        assert_eq!(standings.len(), 2);
        let alice = &standings[0];
        assert_eq!((alice.correct, alice.total, alice.points, alice.weeks_played), (7, 11, 14, 2));
        let bob = &standings[1];
        assert_eq!((bob.correct, bob.weeks_played), (6, 1));
    }

    #[test]
    fn season_is_additive_over_weeks() {
        let first = vec![score("2025-W36", "alice", 4, 6)];
        let second = vec![score("2025-W37", "alice", 2, 6)];
        let both: Vec<_> = first.iter().chain(&second).cloned().collect();

        let split_a = aggregate_season("l1", &first);
        let split_b = aggregate_season("l1", &second);
        let whole = aggregate_season("l1", &both);
        assert_eq!(whole[0].correct, split_a[0].correct + split_b[0].correct);
        assert_eq!(whole[0].points, split_a[0].points + split_b[0].points);
    }

    #[tokio::test]
    async fn open_weeks_do_not_count() {
        let store = MemoryLeagueStore::new();
        store.save_week(week("2025-W36", WeekStatus::Final)).await.unwrap();
        store.save_week(week("2025-W37", WeekStatus::Open)).await.unwrap();
        store
            .save_week_scores(vec![
                score("2025-W36", "alice", 4, 6),
                score("2025-W36", "bob", 5, 6),
            ])
            .await
            .unwrap();
        store
            .save_week_scores(vec![score("2025-W37", "alice", 6, 6)])
            .await
            .unwrap();

        let standings = recompute_season(&store, "l1").await.unwrap();

        assert_eq!(standings[0].user_id, "bob");
        let alice = standings.iter().find(|s| s.user_id == "alice").unwrap();
        assert_eq!((alice.correct, alice.weeks_played), (4, 1));
        assert_eq!(store.list_standings("l1").await.unwrap().len(), 2);
    }
}
