//! Background timers: the periodic results poll and the weekly advance sweep.

use std::time::Duration;

use time::{OffsetDateTime, Time};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, error, info};

use crate::{config::WeeklySchedule, services::league_service, state::SharedState};

/// Spawn both background jobs unless scheduling is disabled.
pub fn spawn(state: SharedState) {
    if !state.config().schedule.enabled {
        info!("background schedules disabled");
        return;
    }
    tokio::spawn(run_results_poll(state.clone()));
    tokio::spawn(run_weekly_advance(state));
}

/// Poll provider results for every league at the configured interval.
pub async fn run_results_poll(state: SharedState) {
    let period = state.config().schedule.poll_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(every_secs = period.as_secs(), "results poll scheduled");

    loop {
        ticker.tick().await;
        if state.is_degraded() {
            debug!("storage unavailable; skipping results poll");
            continue;
        }
        league_service::poll_all_leagues(&state).await;
    }
}

/// Advance leagues whose current week is final once a week.
pub async fn run_weekly_advance(state: SharedState) {
    let schedule = state.config().schedule.weekly_advance;

    loop {
        let wait = until_next_weekly_run(OffsetDateTime::now_utc(), &schedule);
        info!(in_secs = wait.as_secs(), "next weekly advance scheduled");
        sleep(wait).await;

        match league_service::advance_completed_weeks(&state).await {
            Ok(advanced) => info!(leagues = advanced.len(), "weekly advance ran"),
            Err(err) => error!(error = %err, "weekly advance failed"),
        }
    }
}

/// Time from `now` until the next occurrence of the weekly slot, strictly in the future.
pub fn until_next_weekly_run(now: OffsetDateTime, schedule: &WeeklySchedule) -> Duration {
    let local = now.to_offset(schedule.offset);
    let days_ahead = (i64::from(schedule.weekday.number_days_from_monday())
        - i64::from(local.weekday().number_days_from_monday()))
    .rem_euclid(7);
    let at = Time::from_hms(schedule.hour, schedule.minute, 0).unwrap_or(Time::MIDNIGHT);

    let mut next = (local.date() + time::Duration::days(days_ahead))
        .with_time(at)
        .assume_offset(schedule.offset);
    if next <= now {
        next += time::Duration::weeks(1);
    }
    (next - now).unsigned_abs()
}
