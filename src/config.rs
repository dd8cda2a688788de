//! Application-level configuration: results provider, background schedules and admin access.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use time::{UtcOffset, Weekday};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PICKEM_BACK_CONFIG_PATH";
/// Environment variable holding the scores API key.
const ODDS_API_KEY_ENV: &str = "ODDS_API_KEY";
/// Environment variable holding the token admin routes expect.
const ADMIN_TOKEN_ENV: &str = "PICKEM_ADMIN_TOKEN";

/// Sport key used when a week does not name one.
pub const DEFAULT_SPORT_KEY: &str = "americanfootball_ncaaf";
const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Settings of the third-party scores provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub default_sport_key: String,
    /// First lookback window, in days.
    pub short_lookback_days: u32,
    /// Lookback used when the short window returns nothing.
    pub long_lookback_days: u32,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_owned(),
            default_sport_key: DEFAULT_SPORT_KEY.to_owned(),
            short_lookback_days: 3,
            long_lookback_days: 14,
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

/// Weekly instant, in a fixed UTC offset, at which leagues advance to their next week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub hour: u8,
    pub minute: u8,
    pub offset: UtcOffset,
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Sunday,
            hour: 9,
            minute: 0,
            offset: UtcOffset::from_hms(-5, 0, 0).unwrap_or(UtcOffset::UTC),
        }
    }
}

/// Background job timing.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Delay between two results polls.
    pub poll_interval: Duration,
    pub weekly_advance: WeeklySchedule,
    /// Disables both background jobs when false.
    pub enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(180),
            weekly_advance: WeeklySchedule::default(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub schedule: ScheduleConfig,
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then apply
    /// secrets from the environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        sport = %app_config.provider.default_sport_key,
                        poll_secs = app_config.schedule.poll_interval.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_env_secrets()
    }

    fn with_env_secrets(mut self) -> Self {
        self.provider.api_key = non_empty_env(ODDS_API_KEY_ENV);
        if self.provider.api_key.is_none() {
            warn!("{ODDS_API_KEY_ENV} not set; results ingestion is disabled");
        }
        self.admin_token = non_empty_env(ADMIN_TOKEN_ENV).or(self.admin_token);
        if self.admin_token.is_none() {
            warn!("{ADMIN_TOKEN_ENV} not set; admin routes will reject every request");
        }
        self
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    provider: RawProvider,
    schedule: RawSchedule,
    admin_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProvider {
    base_url: Option<String>,
    sport_key: Option<String>,
    short_lookback_days: Option<u32>,
    long_lookback_days: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSchedule {
    enabled: Option<bool>,
    poll_interval_secs: Option<u64>,
    advance_weekday: Option<String>,
    advance_hour: Option<u8>,
    advance_minute: Option<u8>,
    utc_offset_hours: Option<i8>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let provider = ProviderConfig {
            base_url: value
                .provider
                .base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(defaults.provider.base_url),
            default_sport_key: value
                .provider
                .sport_key
                .unwrap_or(defaults.provider.default_sport_key),
            short_lookback_days: value
                .provider
                .short_lookback_days
                .unwrap_or(defaults.provider.short_lookback_days),
            long_lookback_days: value
                .provider
                .long_lookback_days
                .unwrap_or(defaults.provider.long_lookback_days),
            timeout: value
                .provider
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider.timeout),
            api_key: None,
        };

        let fallback = defaults.schedule.weekly_advance;
        let weekly_advance = WeeklySchedule {
            weekday: value
                .schedule
                .advance_weekday
                .as_deref()
                .and_then(parse_weekday)
                .unwrap_or(fallback.weekday),
            hour: value
                .schedule
                .advance_hour
                .filter(|hour| *hour < 24)
                .unwrap_or(fallback.hour),
            minute: value
                .schedule
                .advance_minute
                .filter(|minute| *minute < 60)
                .unwrap_or(fallback.minute),
            offset: value
                .schedule
                .utc_offset_hours
                .and_then(|hours| UtcOffset::from_hms(hours, 0, 0).ok())
                .unwrap_or(fallback.offset),
        };

        let schedule = ScheduleConfig {
            poll_interval: value
                .schedule
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.schedule.poll_interval),
            weekly_advance,
            enabled: value.schedule.enabled.unwrap_or(defaults.schedule.enabled),
        };

        Self {
            provider,
            schedule,
            admin_token: value.admin_token,
        }
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Monday),
        "tuesday" | "tue" => Some(Weekday::Tuesday),
        "wednesday" | "wed" => Some(Weekday::Wednesday),
        "thursday" | "thu" => Some(Weekday::Thursday),
        "friday" | "fri" => Some(Weekday::Friday),
        "saturday" | "sat" => Some(Weekday::Saturday),
        "sunday" | "sun" => Some(Weekday::Sunday),
        _ => None,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
