use crate::dao::models::GameEntity;

/// Home-minus-away differential of a game, `None` until both scores are known.
pub fn tiebreaker_actual(game: &GameEntity) -> Option<i32> {
    game.final_score_home?.checked_sub(game.final_score_away?)
}

/// Distance between a prediction and the actual differential.
pub fn tiebreaker_abs_error(prediction: Option<i32>, actual: Option<i32>) -> Option<u32> {
    Some(prediction?.abs_diff(actual?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::week::tests::game;

    #[test]
    fn differential_is_signed_home_minus_away() {
        assert_eq!(tiebreaker_actual(&game("tb", Some(27), Some(20), true)), Some(7));
        assert_eq!(tiebreaker_actual(&game("tb", Some(13), Some(20), true)), Some(-7));
    }

    #[test]
    fn missing_score_has_no_differential() {
        assert_eq!(tiebreaker_actual(&game("tb", None, Some(20), false)), None);
        assert_eq!(tiebreaker_actual(&game("tb", Some(3), None, false)), None);
    }

    #[test]
    fn extreme_scores_do_not_overflow() {
        assert_eq!(tiebreaker_actual(&game("tb", Some(-5), Some(i32::MAX), true)), None);
        assert_eq!(tiebreaker_actual(&game("tb", Some(i32::MIN), Some(1), true)), None);
        assert_eq!(tiebreaker_abs_error(Some(i32::MIN), Some(i32::MAX)), Some(u32::MAX));
    }

    #[test]
    fn abs_error_needs_both_values() {
        assert_eq!(tiebreaker_abs_error(Some(10), Some(7)), Some(3));
        assert_eq!(tiebreaker_abs_error(Some(-3), Some(7)), Some(10));
        assert_eq!(tiebreaker_abs_error(None, Some(7)), None);
        assert_eq!(tiebreaker_abs_error(Some(10), None), None);
    }
}
