/// League, week, pick and score persistence.
pub mod league_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
