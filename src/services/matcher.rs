//! Reconciles provider score records with the stored games of a week.
//!
//! A game is matched by provider event id first and by normalised team names plus
//! UTC kickoff day otherwise. Decided games are never looked at again, and any
//! record that is incomplete, ambiguous or carries unreadable scores simply leaves
//! the game undecided until a later poll.

use std::collections::HashMap;

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing::debug;

use crate::{
    dao::models::{GameEntity, Winner},
    provider::{ProviderScore, RawScore, provider_event_id},
    scoring::resolve_winner,
};

/// How a provider record was tied to a local game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    EventId,
    TeamsAndDate,
}

/// Final result to write onto one local game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub event_key: String,
    pub final_score_home: i32,
    pub final_score_away: i32,
    pub winner: Winner,
    pub source: MatchSource,
}

/// Lowercase, drop periods, collapse whitespace.
pub fn normalize_team(name: &str) -> String {
    name.to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Composite `away@home#YYYY-MM-DD` key, the date being the UTC calendar day of kickoff.
pub fn match_key(away: &str, home: &str, kickoff: OffsetDateTime) -> String {
    let day = kickoff.to_offset(UtcOffset::UTC).date();
    format!(
        "{}@{}#{:04}-{:02}-{:02}",
        normalize_team(away),
        normalize_team(home),
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

fn provider_key(score: &ProviderScore) -> Option<String> {
    let kickoff = OffsetDateTime::parse(score.commence_time.as_deref()?, &Rfc3339).ok()?;
    Some(match_key(
        score.away_team.as_deref()?,
        score.home_team.as_deref()?,
        kickoff,
    ))
}

/// Produce results for every undecided game a completed provider record can settle.
pub fn match_results(games: &[GameEntity], scores: &[ProviderScore]) -> Vec<GameResult> {
    let mut by_id: HashMap<&str, &ProviderScore> = HashMap::new();
    for score in scores {
        by_id.entry(score.id.trim()).or_insert(score);
    }

    // `None` marks a key claimed by two different provider events.
    let mut by_key: HashMap<String, Option<&ProviderScore>> = HashMap::new();
    for score in scores {
        let Some(key) = provider_key(score) else {
            continue;
        };
        by_key
            .entry(key)
            .and_modify(|slot| {
                if slot.is_some_and(|existing| existing.id.trim() != score.id.trim()) {
                    *slot = None;
                }
            })
            .or_insert(Some(score));
    }

    games
        .iter()
        .filter(|game| !game.decided)
        .filter_map(|game| {
            let (score, source) = match provider_event_id(&game.event_key)
                .and_then(|id| by_id.get(id))
            {
                Some(score) => (*score, MatchSource::EventId),
                None => {
                    let key = match_key(&game.away, &game.home, game.start_time);
                    match by_key.get(&key) {
                        Some(Some(score)) => (*score, MatchSource::TeamsAndDate),
                        Some(None) => {
                            debug!(
                                event_key = %game.event_key,
                                %key,
                                "ambiguous provider match; skipping"
                            );
                            return None;
                        }
                        None => return None,
                    }
                }
            };
            settle(game, score, source)
        })
        .collect()
}

fn settle(game: &GameEntity, score: &ProviderScore, source: MatchSource) -> Option<GameResult> {
    if !score.completed {
        return None;
    }
    let entries = score.scores.as_deref().filter(|entries| entries.len() >= 2)?;

    let points_for = |local: &str, provider: Option<&str>| -> Option<i32> {
        let wanted = [Some(local), provider]
            .into_iter()
            .flatten()
            .map(normalize_team)
            .collect::<Vec<_>>();
        wanted.iter().find_map(|name| {
            entries
                .iter()
                .find(|entry| normalize_team(&entry.name) == *name)
                .and_then(|entry| entry.score.as_ref())
                .and_then(RawScore::points)
        })
    };

    let home = points_for(&game.home, score.home_team.as_deref());
    let away = points_for(&game.away, score.away_team.as_deref());
    let (Some(home), Some(away)) = (home, away) else {
        debug!(
            event_key = %game.event_key,
            provider_id = %score.id,
            "provider scores missing or malformed"
        );
        return None;
    };

    Some(GameResult {
        event_key: game.event_key.clone(),
        final_score_home: home,
        final_score_away: away,
        winner: resolve_winner(Some(home), Some(away))?,
        source,
    })
}

/// Write `results` onto the matching undecided games, returning only the games that changed.
pub fn apply_results(games: &[GameEntity], results: &[GameResult]) -> Vec<GameEntity> {
    let by_key: HashMap<&str, &GameResult> = results
        .iter()
        .map(|result| (result.event_key.as_str(), result))
        .collect();

    games
        .iter()
        .filter(|game| !game.decided)
        .filter_map(|game| {
            let result = by_key.get(game.event_key.as_str())?;
            let mut updated = game.clone();
            updated.final_score_home = Some(result.final_score_home);
            updated.final_score_away = Some(result.final_score_away);
            updated.winner = Some(result.winner);
            updated.decided = true;
            Some(updated)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::provider::ProviderTeamScore;

    fn game(event_key: &str, away: &str, home: &str) -> GameEntity {
        GameEntity {
            league_id: "l1".into(),
            week_id: "2025-W36".into(),
            event_key: event_key.into(),
            home: home.into(),
            away: away.into(),
            start_time: datetime!(2025-09-06 19:30 -4),
            final_score_home: None,
            final_score_away: None,
            winner: None,
            decided: false,
        }
    }

    fn record(id: &str, away: &str, home: &str, scores: &[(&str, RawScore)]) -> ProviderScore {
        ProviderScore {
            id: id.into(),
            sport_key: Some("americanfootball_ncaaf".into()),
            commence_time: Some("2025-09-06T23:30:00Z".into()),
            completed: true,
            home_team: Some(home.into()),
            away_team: Some(away.into()),
            scores: Some(
                scores
                    .iter()
                    .map(|(name, score)| ProviderTeamScore {
                        name: (*name).into(),
                        score: Some(score.clone()),
                    })
                    .collect(),
            ),
        }
    }

    fn text(value: &str) -> RawScore {
        RawScore::Text(value.into())
    }

    fn ohio_state_final(id: &str, home: &str, away: &str) -> ProviderScore {
        record(
            id,
            "Texas",
            "Ohio State",
            &[("Ohio State", text(home)), ("Texas", text(away))],
        )
    }

    #[test]
    fn normalizes_team_names() {
        assert_eq!(normalize_team("  Miami (Fla.)   Hurricanes "), "miami (fla) hurricanes");
        assert_eq!(normalize_team("St. John's"), "st john's");
    }

    #[test]
    fn match_key_uses_utc_day() {
        let late_eastern = datetime!(2025-09-06 21:00 -4);
        assert_eq!(
            match_key("Texas", "Ohio St.", late_eastern),
            "texas@ohio st#2025-09-07"
        );
    }

    #[test]
    fn fuzzy_match_settles_with_numeric_strings() {
        let games = vec![game("local-1", "Texas Longhorns", "Ohio State Buckeyes")];
        let scores = vec![record(
            "evt-9",
            "Texas Longhorns",
            "Ohio State Buckeyes",
            &[("Ohio State Buckeyes", text("14")), ("Texas Longhorns", text("7"))],
        )];

        let results = match_results(&games, &scores);
        assert_eq!(
            results,
            vec![GameResult {
                event_key: "local-1".into(),
                final_score_home: 14,
                final_score_away: 7,
                winner: Winner::Home,
                source: MatchSource::TeamsAndDate,
            }]
        );
    }

    #[test]
    fn exact_id_wins_over_fuzzy_key() {
        let games = vec![game("evt-1:0", "Texas", "Ohio State")];
        let scores = vec![
            ohio_state_final("decoy", "30", "0"),
            record(
                "evt-1",
                "Texas Longhorns",
                "Ohio State Buckeyes",
                &[("Ohio State Buckeyes", text("10")), ("Texas Longhorns", text("20"))],
            ),
        ];

        let results = match_results(&games, &scores);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, MatchSource::EventId);
        assert_eq!(results[0].winner, Winner::Away);
        assert_eq!((results[0].final_score_home, results[0].final_score_away), (10, 20));
    }

    #[test]
    fn incomplete_exact_match_does_not_fall_back() {
        let games = vec![game("evt-1", "Texas", "Ohio State")];
        let mut live = ohio_state_final("evt-1", "3", "0");
        live.completed = false;
        let other = ohio_state_final("evt-2", "3", "0");

        assert!(match_results(&games, &[live, other]).is_empty());
    }

    #[test]
    fn decided_games_are_never_reexamined() {
        let mut decided = game("evt-1", "Texas", "Ohio State");
        decided.final_score_home = Some(21);
        decided.final_score_away = Some(24);
        decided.winner = Some(Winner::Away);
        decided.decided = true;
        let scores = vec![ohio_state_final("evt-1", "40", "0")];

        let results = match_results(std::slice::from_ref(&decided), &scores);
        assert!(results.is_empty());
        let forced = vec![GameResult {
            event_key: "evt-1".into(),
            final_score_home: 40,
            final_score_away: 0,
            winner: Winner::Home,
            source: MatchSource::EventId,
        }];
        assert!(apply_results(&[decided], &forced).is_empty());
    }

    #[test]
    fn ambiguous_fuzzy_keys_are_skipped() {
        let games = vec![game("local-1", "Texas", "Ohio State")];
        let scores = vec![
            ohio_state_final("a", "1", "0"),
            record(
                "b",
                "Texas",
                "Ohio  State.",
                &[("Ohio State.", text("0")), ("Texas", text("1"))],
            ),
        ];
        assert!(match_results(&games, &scores).is_empty());
    }

    #[test]
    fn malformed_or_partial_scores_are_skipped() {
        let games = vec![game("local-1", "Texas", "Ohio State")];
        let malformed = ohio_state_final("a", "TBD", "3");
        assert!(match_results(&games, &[malformed]).is_empty());

        let partial = record("a", "Texas", "Ohio State", &[("Ohio State", text("7"))]);
        assert!(match_results(&games, &[partial]).is_empty());
    }

    #[test]
    fn implausible_scores_leave_the_game_undecided() {
        let games = vec![game("evt-1", "Texas", "Ohio State")];
        let negative = ohio_state_final("evt-1", "-5", "2147483647");
        assert!(match_results(&games, &[negative]).is_empty());

        let runaway = ohio_state_final("evt-1", "301", "0");
        assert!(match_results(&games, &[runaway]).is_empty());
    }

    #[test]
    fn apply_results_marks_games_decided() {
        let games = vec![game("local-1", "Texas", "Ohio State"), game("local-2", "Utah", "BYU")];
        let results = vec![GameResult {
            event_key: "local-2".into(),
            final_score_home: 17,
            final_score_away: 17,
            winner: Winner::Tie,
            source: MatchSource::TeamsAndDate,
        }];

        let updated = apply_results(&games, &results);
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].event_key, "local-2");
        assert!(updated[0].decided);
        assert_eq!(updated[0].winner, Some(Winner::Tie));
        assert!(updated[0].validate().is_ok());
    }
}
