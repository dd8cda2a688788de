use serde::{Deserialize, Serialize};

pub const LEAGUE_COLLECTION: &str = "leagues";
pub const WEEK_COLLECTION: &str = "weeks";
pub const GAME_COLLECTION: &str = "games";
pub const PICK_COLLECTION: &str = "picks";
pub const SCORE_COLLECTION: &str = "week_scores";
pub const STANDING_COLLECTION: &str = "season_standings";

/// Stored entity keyed by a composite string id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub body: T,
}

/// Join key parts into a document id. Parts never contain `/` in practice.
pub fn composite_id(parts: &[&str]) -> String {
    parts.join("/")
}
