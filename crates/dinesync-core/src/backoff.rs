//! Refresh backoff policy.
//!
//! A pure function from (consecutive error count, error kind) to the delay
//! before the next refresh attempt. Keeping this free of clocks and I/O is
//! what lets the scheduler's retry cadence be tested in isolation.

use chrono::Duration;

use crate::RefreshErrorKind;

/// Tunables for [`next_delay`], sourced from [`crate::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    /// Normal refresh interval after a successful update.
    pub base_ttl: Duration,
    /// Fixed retry window for provider-side transient errors.
    pub retry_window: Duration,
    /// Cap on the parse-failure backoff, as a multiple of `base_ttl`.
    pub max_multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ttl: Duration::days(30),
            retry_window: Duration::hours(4),
            max_multiplier: 10,
        }
    }
}

/// Delay before the next refresh attempt after a recoverable failure.
///
/// `RateLimited`, `Timeout`, and `Transport` are provider or network
/// conditions, not data-quality issues: they retry after a short fixed
/// window regardless of `error_count`. `ParseFailure` doubles from the base
/// TTL per consecutive failure (`base * 2^error_count`) and is capped at
/// `max_multiplier * base`, so a permanently-unparseable record is retried
/// ever less often without being abandoned.
///
/// `NotFound` never reaches this function — the scheduler deactivates the
/// record instead. It is mapped to the fixed window here only so the
/// function stays total.
#[must_use]
pub fn next_delay(error_count: u32, kind: RefreshErrorKind, cfg: &BackoffConfig) -> Duration {
    match kind {
        RefreshErrorKind::RateLimited | RefreshErrorKind::Timeout | RefreshErrorKind::Transport => {
            cfg.retry_window
        }
        RefreshErrorKind::ParseFailure => {
            let cap = cfg.base_ttl * i32::try_from(cfg.max_multiplier).unwrap_or(i32::MAX);
            let shift = error_count.min(10);
            let grown = cfg.base_ttl * (1i32 << shift);
            grown.min(cap)
        }
        RefreshErrorKind::NotFound => cfg.retry_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BackoffConfig {
        BackoffConfig {
            base_ttl: Duration::days(30),
            retry_window: Duration::hours(4),
            max_multiplier: 10,
        }
    }

    #[test]
    fn transient_errors_use_fixed_window() {
        let cfg = cfg();
        for kind in [
            RefreshErrorKind::RateLimited,
            RefreshErrorKind::Timeout,
            RefreshErrorKind::Transport,
        ] {
            assert_eq!(next_delay(0, kind, &cfg), Duration::hours(4));
            assert_eq!(
                next_delay(7, kind, &cfg),
                Duration::hours(4),
                "window is independent of error_count"
            );
        }
    }

    #[test]
    fn parse_failure_grows_exponentially() {
        let cfg = cfg();
        assert_eq!(
            next_delay(0, RefreshErrorKind::ParseFailure, &cfg),
            Duration::days(30)
        );
        assert_eq!(
            next_delay(1, RefreshErrorKind::ParseFailure, &cfg),
            Duration::days(60)
        );
        assert_eq!(
            next_delay(3, RefreshErrorKind::ParseFailure, &cfg),
            Duration::days(240)
        );
    }

    #[test]
    fn parse_failure_backoff_is_monotonic_and_capped() {
        let cfg = cfg();
        let cap = Duration::days(300);
        let mut previous = Duration::zero();
        for count in 0..20 {
            let delay = next_delay(count, RefreshErrorKind::ParseFailure, &cfg);
            assert!(delay >= previous, "delay must never shrink");
            assert!(delay <= cap, "delay must respect the cap");
            previous = delay;
        }
        assert_eq!(previous, cap, "large counts settle at the cap");
    }
}
