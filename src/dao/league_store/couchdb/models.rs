use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LEAGUE_PREFIX: &str = "league::";
pub const WEEK_PREFIX: &str = "week::";
pub const GAME_PREFIX: &str = "game::";
pub const PICK_PREFIX: &str = "pick::";
pub const SCORE_PREFIX: &str = "score::";
pub const STANDING_PREFIX: &str = "standing::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Any stored entity wrapped with CouchDB's bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

/// Only the revision of an existing document, read before overwriting it.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: Option<String>,
}

pub fn league_doc_id(league_id: &str) -> String {
    format!("{LEAGUE_PREFIX}{league_id}")
}

pub fn week_doc_id(league_id: &str, week_id: &str) -> String {
    format!("{}{week_id}", week_prefix(league_id))
}

pub fn week_prefix(league_id: &str) -> String {
    format!("{WEEK_PREFIX}{league_id}::")
}

pub fn game_doc_id(league_id: &str, week_id: &str, event_key: &str) -> String {
    format!("{}{event_key}", week_scoped_prefix(GAME_PREFIX, league_id, week_id))
}

pub fn pick_doc_id(league_id: &str, week_id: &str, user_id: &str) -> String {
    format!("{}{user_id}", week_scoped_prefix(PICK_PREFIX, league_id, week_id))
}

pub fn score_doc_id(league_id: &str, week_id: &str, user_id: &str) -> String {
    format!("{}{user_id}", week_scoped_prefix(SCORE_PREFIX, league_id, week_id))
}

pub fn standing_doc_id(league_id: &str, user_id: &str) -> String {
    format!("{}{user_id}", standing_prefix(league_id))
}

pub fn standing_prefix(league_id: &str) -> String {
    format!("{STANDING_PREFIX}{league_id}::")
}

/// Prefix shared by every document of `kind` stored under one week.
pub fn week_scoped_prefix(kind: &str, league_id: &str, week_id: &str) -> String {
    format!("{kind}{league_id}::{week_id}::")
}
