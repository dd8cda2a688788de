use std::ops::RangeInclusive;

use serde::Deserialize;

/// Scores outside this range are treated as corrupt feed data.
pub const PLAUSIBLE_SCORE: RangeInclusive<i32> = 0..=300;

/// One event of the provider's scores feed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderScore {
    pub id: String,
    #[serde(default)]
    pub sport_key: Option<String>,
    /// ISO-8601 kickoff, parsed lazily by the matcher.
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub scores: Option<Vec<ProviderTeamScore>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderTeamScore {
    pub name: String,
    #[serde(default)]
    pub score: Option<RawScore>,
}

/// Score as sent on the wire: usually a numeric string, sometimes a number.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawScore {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawScore {
    /// Whole-point value, or `None` when the payload is not a plausible score.
    pub fn points(&self) -> Option<i32> {
        let points = match self {
            RawScore::Integer(value) => i32::try_from(*value).ok(),
            RawScore::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                let rounded = *value as i64;
                i32::try_from(rounded).ok()
            }
            RawScore::Float(_) => None,
            RawScore::Text(text) => text.trim().parse::<i32>().ok(),
        }?;
        PLAUSIBLE_SCORE.contains(&points).then_some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_odds_api_payload() {
        let payload = r#"[{
            "id": "e912304de2b2ce35b473ce2ecd3d1502",
            "sport_key": "americanfootball_ncaaf",
            "commence_time": "2025-09-06T19:30:00Z",
            "completed": true,
            "home_team": "Ohio State Buckeyes",
            "away_team": "Texas Longhorns",
            "scores": [
                { "name": "Ohio State Buckeyes", "score": "14" },
                { "name": "Texas Longhorns", "score": 7 }
            ],
            "last_update": "2025-09-06T23:01:12Z"
        }, {
            "id": "upcoming",
            "commence_time": "2025-09-13T19:30:00Z",
            "completed": false,
            "home_team": "Michigan Wolverines",
            "away_team": "Oklahoma Sooners",
            "scores": null
        }]"#;
        let scores: Vec<ProviderScore> = serde_json::from_str(payload).unwrap();

        assert_eq!(scores.len(), 2);
        let team_scores = scores[0].scores.as_ref().unwrap();
        assert_eq!(team_scores[0].score.as_ref().and_then(RawScore::points), Some(14));
        assert_eq!(team_scores[1].score.as_ref().and_then(RawScore::points), Some(7));
        assert!(scores[1].scores.is_none());
    }

    #[test]
    fn rejects_non_numeric_scores() {
        assert_eq!(RawScore::Text(" 21 ".into()).points(), Some(21));
        assert_eq!(RawScore::Text("21-ish".into()).points(), None);
        assert_eq!(RawScore::Float(17.0).points(), Some(17));
        assert_eq!(RawScore::Float(17.5).points(), None);
        assert_eq!(RawScore::Integer(i64::MAX).points(), None);
    }

    #[test]
    fn rejects_implausible_scores() {
        assert_eq!(RawScore::Text("-5".into()).points(), None);
        assert_eq!(RawScore::Text("2147483647".into()).points(), None);
        assert_eq!(RawScore::Integer(301).points(), None);
        assert_eq!(RawScore::Float(-1.0).points(), None);
        assert_eq!(RawScore::Integer(0).points(), Some(0));
        assert_eq!(RawScore::Text("300".into()).points(), Some(300));
    }
}
