//! Pure scoring rules shared by every recomputation path (scheduled poll, game
//! writes and admin actions). Nothing here touches storage.

mod ranking;
mod tiebreaker;
mod verdict;
mod week;
mod winner;

pub use ranking::{accuracy, rank_standings, rank_week_scores};
pub use tiebreaker::{tiebreaker_abs_error, tiebreaker_actual};
pub use verdict::{PickVerdict, pick_verdict};
pub use week::{
    DEFAULT_POINTS_PER_CORRECT, GAMES_PER_WEEK, ScoringSettings, WeekScore, compute_week_score,
    is_pick_complete,
};
pub use winner::{resolve_winner, winner_of};
