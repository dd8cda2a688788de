//! Validation helpers for DTOs.

use std::collections::{BTreeMap, HashSet};

use validator::ValidationError;

use crate::{dao::models::Side, dto::admin::GameInput, scoring::GAMES_PER_WEEK};

/// Validates a week identifier of the form `YYYY-Www` with a week number in `1..=53`.
///
/// # Examples
///
/// ```ignore
/// validate_week_id("2025-W36") // Ok
/// validate_week_id("2025-36")  // Err - missing `W`
/// validate_week_id("2025-W54") // Err - out of range
/// ```
pub fn validate_week_id(id: &str) -> Result<(), ValidationError> {
    if parse_week_id(id).is_none() {
        let mut err = ValidationError::new("week_id_format");
        err.message = Some(format!("week id must look like `2025-W36` (got `{id}`)").into());
        return Err(err);
    }
    Ok(())
}

/// Split `YYYY-Www` into its year and week number.
pub fn parse_week_id(id: &str) -> Option<(u16, u8)> {
    let (year, week) = id.split_once("-W")?;
    if year.len() != 4 || week.len() != 2 {
        return None;
    }
    if !year.chars().chain(week.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let week: u8 = week.parse().ok()?;
    (1..=53).contains(&week).then_some(())?;
    Some((year.parse().ok()?, week))
}

/// A week holds at most [`GAMES_PER_WEEK`] games with distinct, non-blank event keys.
pub fn validate_week_games(games: &[GameInput]) -> Result<(), ValidationError> {
    if games.len() > GAMES_PER_WEEK {
        let mut err = ValidationError::new("games_count");
        err.message = Some(
            format!("a week holds at most {GAMES_PER_WEEK} games (got {})", games.len()).into(),
        );
        return Err(err);
    }

    let mut seen = HashSet::new();
    for game in games {
        let key = game.event_key.trim();
        if key.is_empty() || !seen.insert(key) {
            let mut err = ValidationError::new("games_event_key");
            err.message = Some(format!("event key `{key}` is blank or repeated").into());
            return Err(err);
        }
    }
    Ok(())
}

/// Picks cover at most [`GAMES_PER_WEEK`] games.
pub fn validate_selections(selections: &BTreeMap<String, Side>) -> Result<(), ValidationError> {
    if selections.len() > GAMES_PER_WEEK {
        let mut err = ValidationError::new("selections_count");
        err.message = Some(format!("at most {GAMES_PER_WEEK} selections are allowed").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_week_id_valid() {
        assert!(validate_week_id("2025-W36").is_ok());
        assert!(validate_week_id("2026-W01").is_ok());
        assert!(validate_week_id("2020-W53").is_ok());
    }

    #[test]
    fn test_validate_week_id_invalid() {
        assert!(validate_week_id("2025-36").is_err());
        assert!(validate_week_id("2025-W6").is_err());
        assert!(validate_week_id("2025-W00").is_err());
        assert!(validate_week_id("2025-W54").is_err());
        assert!(validate_week_id("25-W10").is_err());
        assert!(validate_week_id("").is_err());
    }

    #[test]
    fn test_parse_week_id() {
        assert_eq!(parse_week_id("2025-W07"), Some((2025, 7)));
    }
}
