/// Admin actions: seeding, manual results and on-demand pipeline runs.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Scoring pipeline orchestration shared by every trigger.
pub mod league_service;
/// Provider record to local game reconciliation.
pub mod matcher;
/// Read-only league views and pick submission.
pub mod public_service;
/// Week scoring, finalization and advance.
pub mod recompute_service;
/// Provider results ingestion.
pub mod results_sync;
/// Background poll and weekly advance timers.
pub mod scheduler;
/// Season standings aggregation.
pub mod season_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
