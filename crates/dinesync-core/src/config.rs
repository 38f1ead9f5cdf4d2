use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("DINESYNC_ENV", "development"));
    let log_level = or_default("DINESYNC_LOG_LEVEL", "info");

    let places_api_key = lookup("DINESYNC_PLACES_API_KEY").ok();
    let places_base_url = or_default(
        "DINESYNC_PLACES_BASE_URL",
        "https://maps.googleapis.com/maps/api/place",
    );
    let places_timeout_secs = parse_u64("DINESYNC_PLACES_TIMEOUT_SECS", "10")?;
    let inter_request_delay_ms = parse_u64("DINESYNC_INTER_REQUEST_DELAY_MS", "250")?;

    let daily_quota = parse_u32("DINESYNC_DAILY_QUOTA", "950")?;
    let quota_tz_raw = or_default("DINESYNC_QUOTA_TZ", "UTC");
    let quota_tz = quota_tz_raw
        .parse::<chrono_tz::Tz>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "DINESYNC_QUOTA_TZ".to_string(),
            reason: e.to_string(),
        })?;

    let base_ttl_days = parse_i64("DINESYNC_BASE_TTL_DAYS", "30")?;
    let retry_window_hours = parse_i64("DINESYNC_RETRY_WINDOW_HOURS", "4")?;
    let backoff_max_multiplier = parse_u32("DINESYNC_BACKOFF_MAX_MULTIPLIER", "10")?;
    let batch_size = parse_usize("DINESYNC_BATCH_SIZE", "25")?;

    let db_max_connections = parse_u32("DINESYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("DINESYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("DINESYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        places_api_key,
        places_base_url,
        places_timeout_secs,
        inter_request_delay_ms,
        daily_quota,
        quota_tz,
        base_ttl_days,
        retry_window_hours,
        backoff_max_multiplier,
        batch_size,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
