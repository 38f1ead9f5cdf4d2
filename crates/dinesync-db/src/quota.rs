//! Database operations for the `quota_usage` table.
//!
//! One row per calendar date in the configured quota zone. Keying by date
//! means the counter "resets at local midnight" without any reset job: a
//! new day simply reads as zero.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::DbError;

/// Number of upstream calls already consumed on `date`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn quota_used_on(pool: &PgPool, date: NaiveDate) -> Result<i64, DbError> {
    let used: Option<i32> = sqlx::query_scalar("SELECT used FROM quota_usage WHERE usage_date = $1")
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(i64::from(used.unwrap_or(0)))
}

/// Adds `calls` to the day's counter and returns the new total.
///
/// The increment is a single upsert so concurrent batch invocations cannot
/// drop counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn add_quota_usage(pool: &PgPool, date: NaiveDate, calls: i32) -> Result<i64, DbError> {
    let used: i32 = sqlx::query_scalar(
        "INSERT INTO quota_usage (usage_date, used) \
         VALUES ($1, $2) \
         ON CONFLICT (usage_date) DO UPDATE SET \
             used = quota_usage.used + EXCLUDED.used, \
             updated_at = NOW() \
         RETURNING used",
    )
    .bind(date)
    .bind(calls)
    .fetch_one(pool)
    .await?;

    Ok(i64::from(used))
}
