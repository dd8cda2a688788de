use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use self::validation::parse_week_id;

pub mod admin;
pub mod health;
pub mod leaderboard;
pub mod public;
pub mod sse;
pub mod validation;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Display label of a week id: `2025-W36` becomes `Week 36 (2025)`.
///
/// Ids that do not follow the `YYYY-Www` shape are returned unchanged.
pub fn format_week_label(week_id: &str) -> String {
    match parse_week_id(week_id) {
        Some((year, week)) => format!("Week {week} ({year})"),
        None => week_id.to_owned(),
    }
}
