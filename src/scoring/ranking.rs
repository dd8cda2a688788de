use std::cmp::Ordering;

use crate::dao::models::{SeasonStandingEntity, WeekScoreEntity};

/// Share of decided games picked correctly, `0.0` when nothing was decided.
pub fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total)
    }
}

/// Order a week leaderboard: most correct first, then closest tiebreaker.
///
/// Users without a tiebreaker error rank after those with one; user id breaks
/// any remaining tie so the order is stable across runs.
pub fn rank_week_scores(scores: &mut [WeekScoreEntity]) {
    scores.sort_by(|a, b| {
        b.correct
            .cmp(&a.correct)
            .then_with(|| compare_abs_error(a.tiebreaker_abs_error, b.tiebreaker_abs_error))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

fn compare_abs_error(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order season standings by points, correct picks, then accuracy.
pub fn rank_standings(standings: &mut [SeasonStandingEntity]) {
    standings.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.correct.cmp(&a.correct))
            .then_with(|| {
                accuracy(b.correct, b.total)
                    .partial_cmp(&accuracy(a.correct, a.total))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
