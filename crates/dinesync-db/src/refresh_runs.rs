//! Database operations for the `refresh_runs` audit table.
//!
//! Every scheduler invocation, dry runs included, leaves one row recording
//! what it selected and how each record fared.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `refresh_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub dry_run: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub selected: i32,
    pub updated: i32,
    pub not_found: i32,
    pub parse_failed: i32,
    pub rate_limited: i32,
    pub transport_failed: i32,
    pub skipped: i32,
    pub upstream_calls: i32,
    pub quota_exceeded: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Final per-run counters persisted on completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub selected: i32,
    pub updated: i32,
    pub not_found: i32,
    pub parse_failed: i32,
    pub rate_limited: i32,
    pub transport_failed: i32,
    pub skipped: i32,
    pub upstream_calls: i32,
    pub quota_exceeded: bool,
}

const ALL_COLUMNS: &str = "id, public_id, trigger_source, status, dry_run, started_at, \
     completed_at, selected, updated, not_found, parse_failed, rate_limited, transport_failed, \
     skipped, upstream_calls, quota_exceeded, error_message, created_at";

/// Creates a new refresh run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_refresh_run(
    pool: &PgPool,
    trigger_source: &str,
    dry_run: bool,
) -> Result<RefreshRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, RefreshRunRow>(&format!(
        "INSERT INTO refresh_runs (public_id, trigger_source, status, dry_run) \
         VALUES ($1, $2, 'queued', $3) \
         RETURNING {ALL_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(dry_run)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_refresh_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE refresh_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }
    Ok(())
}

/// Marks a run as `succeeded` and persists its final counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_refresh_run(
    pool: &PgPool,
    id: i64,
    counts: &RunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE refresh_runs SET \
             status = 'succeeded', \
             completed_at = NOW(), \
             selected = $1, \
             updated = $2, \
             not_found = $3, \
             parse_failed = $4, \
             rate_limited = $5, \
             transport_failed = $6, \
             skipped = $7, \
             upstream_calls = $8, \
             quota_exceeded = $9 \
         WHERE id = $10 AND status = 'running'",
    )
    .bind(counts.selected)
    .bind(counts.updated)
    .bind(counts.not_found)
    .bind(counts.parse_failed)
    .bind(counts.rate_limited)
    .bind(counts.transport_failed)
    .bind(counts.skipped)
    .bind(counts.upstream_calls)
    .bind(counts.quota_exceeded)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_refresh_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE refresh_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_refresh_run(pool: &PgPool, id: i64) -> Result<RefreshRunRow, DbError> {
    let row = sqlx::query_as::<_, RefreshRunRow>(&format!(
        "SELECT {ALL_COLUMNS} FROM refresh_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_refresh_runs(pool: &PgPool, limit: i64) -> Result<Vec<RefreshRunRow>, DbError> {
    let rows = sqlx::query_as::<_, RefreshRunRow>(&format!(
        "SELECT {ALL_COLUMNS} FROM refresh_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
