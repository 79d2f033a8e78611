use std::env;
use tracing::warn;

/// Scheduling tunables, read once at startup.
///
/// Every knob has a production default so the core works without any
/// environment configured; a malformed value falls back with a warning
/// instead of failing startup.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Earliest wall-clock time a template may start ("HH:MM").
    pub clinic_open_time: String,
    /// Latest wall-clock time a template may end ("HH:MM").
    pub clinic_close_time: String,
    /// Slot width used when the caller does not request one.
    pub default_slot_minutes: i64,
    /// Query window applied when the caller gives no range.
    pub default_lookahead_days: i64,
    /// Upper bound, in days, for the forward fallback search.
    pub fallback_max_days: i64,
    /// Day-level suggestions collected before the fallback search stops.
    pub max_suggestions: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            clinic_open_time: "06:00".to_string(),
            clinic_close_time: "22:00".to_string(),
            default_slot_minutes: 30,
            default_lookahead_days: 14,
            fallback_max_days: 14,
            max_suggestions: 5,
        }
    }
}

impl ScheduleConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            clinic_open_time: env::var("CLINIC_OPEN_TIME").unwrap_or_else(|_| {
                warn!("CLINIC_OPEN_TIME not set, using {}", defaults.clinic_open_time);
                defaults.clinic_open_time.clone()
            }),
            clinic_close_time: env::var("CLINIC_CLOSE_TIME").unwrap_or_else(|_| {
                warn!("CLINIC_CLOSE_TIME not set, using {}", defaults.clinic_close_time);
                defaults.clinic_close_time.clone()
            }),
            default_slot_minutes: parse_env("DEFAULT_SLOT_MINUTES", defaults.default_slot_minutes),
            default_lookahead_days: parse_env(
                "AVAILABILITY_LOOKAHEAD_DAYS",
                defaults.default_lookahead_days,
            ),
            fallback_max_days: parse_env("FALLBACK_SEARCH_MAX_DAYS", defaults.fallback_max_days),
            max_suggestions: parse_env("FALLBACK_MAX_SUGGESTIONS", defaults.max_suggestions),
        }
    }
}

fn parse_env<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value, using {}", key, default);
            default
        }),
        Err(_) => default,
    }
}
