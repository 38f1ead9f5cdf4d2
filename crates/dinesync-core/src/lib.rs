pub mod app_config;
pub mod backoff;
pub mod config;
pub mod hours;
pub mod schedule;
pub mod status;

pub use app_config::{AppConfig, Environment};
pub use backoff::{next_delay, BackoffConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use hours::{parse_hours, HoursParseError};
pub use schedule::{DayHours, TimeInterval, WeeklySchedule};
pub use status::{evaluate, HoursStatus, StatusReason};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Classification of a failed refresh attempt, shared between the upstream
/// client, the backoff policy, and the persisted `last_error_kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshErrorKind {
    /// The place does not exist upstream. Terminal — deactivates the record.
    NotFound,
    /// Provider returned an over-quota / 429 response.
    RateLimited,
    /// The request exceeded the per-call timeout.
    Timeout,
    /// Network, TLS, or provider-side failure (including malformed responses).
    Transport,
    /// The response arrived but its hours text could not be understood.
    ParseFailure,
}

impl RefreshErrorKind {
    /// Stable string form used in the `last_error_kind` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshErrorKind::NotFound => "not_found",
            RefreshErrorKind::RateLimited => "rate_limited",
            RefreshErrorKind::Timeout => "timeout",
            RefreshErrorKind::Transport => "transport",
            RefreshErrorKind::ParseFailure => "parse_failure",
        }
    }

    /// True for errors the scheduler retries via the backoff policy.
    /// `NotFound` is the one terminal kind.
    #[must_use]
    pub fn is_recoverable(self) -> bool {
        !matches!(self, RefreshErrorKind::NotFound)
    }
}

impl std::fmt::Display for RefreshErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_terminal() {
        assert!(!RefreshErrorKind::NotFound.is_recoverable());
        assert!(RefreshErrorKind::RateLimited.is_recoverable());
        assert!(RefreshErrorKind::ParseFailure.is_recoverable());
    }

    #[test]
    fn error_kind_round_trips_through_display() {
        assert_eq!(RefreshErrorKind::ParseFailure.to_string(), "parse_failure");
        assert_eq!(RefreshErrorKind::Timeout.to_string(), "timeout");
    }
}
