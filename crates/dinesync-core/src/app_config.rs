use chrono::Duration;
use chrono_tz::Tz;

use crate::backoff::BackoffConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub places_api_key: Option<String>,
    pub places_base_url: String,
    pub places_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub daily_quota: u32,
    /// Zone whose calendar date keys the daily quota counter.
    pub quota_tz: Tz,
    pub base_ttl_days: i64,
    pub retry_window_hours: i64,
    pub backoff_max_multiplier: u32,
    pub batch_size: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Backoff tunables derived from the TTL settings.
    #[must_use]
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            base_ttl: Duration::days(self.base_ttl_days),
            retry_window: Duration::hours(self.retry_window_hours),
            max_multiplier: self.backoff_max_multiplier,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "places_api_key",
                &self.places_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("places_base_url", &self.places_base_url)
            .field("places_timeout_secs", &self.places_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("daily_quota", &self.daily_quota)
            .field("quota_tz", &self.quota_tz)
            .field("base_ttl_days", &self.base_ttl_days)
            .field("retry_window_hours", &self.retry_window_hours)
            .field("backoff_max_multiplier", &self.backoff_max_multiplier)
            .field("batch_size", &self.batch_size)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
