//! Database operations for the `place_records` table.
//!
//! All refresh-outcome writes are single UPDATE statements so a record's
//! read-modify-write cannot be torn by an overlapping batch invocation;
//! last-writer-wins is acceptable, a half-applied update is not.

use chrono::{DateTime, Utc};
use dinesync_core::WeeklySchedule;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `place_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaceRecordRow {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub search_address: String,
    pub external_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub raw_hours_text: Option<String>,
    pub canonical_schedule: Option<serde_json::Value>,
    pub timezone: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub next_update: Option<DateTime<Utc>>,
    pub error_count: i32,
    pub last_error_kind: Option<String>,
    pub last_error_message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaceRecordRow {
    /// Whether the record carries a successfully-parsed schedule. Callers
    /// must check this rather than assuming a schedule exists.
    #[must_use]
    pub fn hours_parsed(&self) -> bool {
        self.canonical_schedule.is_some()
    }

    /// Deserializes the stored canonical schedule, if any. A stored value
    /// that no longer deserializes is treated the same as no schedule.
    #[must_use]
    pub fn schedule(&self) -> Option<WeeklySchedule> {
        self.canonical_schedule
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The record's IANA zone, falling back to UTC when unset or invalid.
    #[must_use]
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone
            .as_deref()
            .and_then(|z| z.parse().ok())
            .unwrap_or(chrono_tz::UTC)
    }
}

/// Sparse update produced by one refresh: `Some` overwrites, `None` keeps
/// the cached value. Models the partial-update contract in the type system
/// so an absent upstream field can never blank a cached one.
#[derive(Debug, Clone, Default)]
pub struct PlacePatch {
    pub external_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub raw_hours_text: Option<String>,
    pub canonical_schedule: Option<serde_json::Value>,
}

const ALL_COLUMNS: &str = "id, restaurant_id, name, search_address, external_id, address, phone, \
     website, rating, raw_hours_text, canonical_schedule, timezone, last_updated, next_update, \
     error_count, last_error_kind, last_error_message, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches the cached record for a restaurant, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_place_record(
    pool: &PgPool,
    restaurant_id: i64,
) -> Result<Option<PlaceRecordRow>, DbError> {
    let row = sqlx::query_as::<_, PlaceRecordRow>(&format!(
        "SELECT {ALL_COLUMNS} FROM place_records WHERE restaurant_id = $1"
    ))
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Selects up to `limit` active records due for refresh at `now`, oldest
/// `next_update` first with never-attempted records (NULL) prioritized.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_due(
    pool: &PgPool,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<PlaceRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, PlaceRecordRow>(&format!(
        "SELECT {ALL_COLUMNS} FROM place_records \
         WHERE is_active AND (next_update IS NULL OR next_update <= $1) \
         ORDER BY next_update ASC NULLS FIRST, id ASC \
         LIMIT $2"
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Administrative selection override: active records whose last refresh
/// attempt is older than `cutoff` (or never happened), regardless of
/// `next_update`. Used by the `days_threshold` batch parameter to reach
/// records a backoff has pushed far into the future.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_stale(
    pool: &PgPool,
    limit: i64,
    cutoff: DateTime<Utc>,
) -> Result<Vec<PlaceRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, PlaceRecordRow>(&format!(
        "SELECT {ALL_COLUMNS} FROM place_records \
         WHERE is_active AND (last_updated IS NULL OR last_updated <= $1) \
         ORDER BY last_updated ASC NULLS FIRST, id ASC \
         LIMIT $2"
    ))
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Creates the cached record for a restaurant, or refreshes its search keys
/// if it already exists. Records are created lazily on first reference or
/// in bulk by the seed workflow.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn create_place_record(
    pool: &PgPool,
    restaurant_id: i64,
    name: &str,
    search_address: &str,
    timezone: Option<&str>,
) -> Result<PlaceRecordRow, DbError> {
    let row = sqlx::query_as::<_, PlaceRecordRow>(&format!(
        "INSERT INTO place_records (restaurant_id, name, search_address, timezone) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (restaurant_id) DO UPDATE SET \
             name = EXCLUDED.name, \
             search_address = EXCLUDED.search_address, \
             timezone = COALESCE(EXCLUDED.timezone, place_records.timezone), \
             updated_at = NOW() \
         RETURNING {ALL_COLUMNS}"
    ))
    .bind(restaurant_id)
    .bind(name)
    .bind(search_address)
    .bind(timezone)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a successful refresh: patches the non-empty fields, resets the
/// error counters, and schedules the next refresh.
///
/// `COALESCE($patch, column)` keeps the cached value wherever the patch is
/// `None`, enforcing the absent-means-keep contract in one statement.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn apply_refresh_success(
    pool: &PgPool,
    id: i64,
    patch: &PlacePatch,
    now: DateTime<Utc>,
    next_update: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE place_records SET \
             external_id        = COALESCE($1, external_id), \
             address            = COALESCE($2, address), \
             phone              = COALESCE($3, phone), \
             website            = COALESCE($4, website), \
             rating             = COALESCE($5, rating), \
             raw_hours_text     = COALESCE($6, raw_hours_text), \
             canonical_schedule = COALESCE($7, canonical_schedule), \
             last_updated       = $8, \
             next_update        = $9, \
             error_count        = 0, \
             last_error_kind    = NULL, \
             last_error_message = NULL, \
             updated_at         = NOW() \
         WHERE id = $10",
    )
    .bind(&patch.external_id)
    .bind(&patch.address)
    .bind(&patch.phone)
    .bind(&patch.website)
    .bind(patch.rating)
    .bind(&patch.raw_hours_text)
    .bind(&patch.canonical_schedule)
    .bind(now)
    .bind(next_update)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Applies the field patch from a response whose hours text failed to
/// parse: the other fields update normally, only the schedule stays stale,
/// and the failure is counted for the backoff policy.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn apply_fields_with_parse_failure(
    pool: &PgPool,
    id: i64,
    patch: &PlacePatch,
    message: &str,
    now: DateTime<Utc>,
    next_update: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE place_records SET \
             external_id        = COALESCE($1, external_id), \
             address            = COALESCE($2, address), \
             phone              = COALESCE($3, phone), \
             website            = COALESCE($4, website), \
             rating             = COALESCE($5, rating), \
             raw_hours_text     = COALESCE($6, raw_hours_text), \
             last_updated       = $7, \
             next_update        = $8, \
             error_count        = error_count + 1, \
             last_error_kind    = 'parse_failure', \
             last_error_message = $9, \
             updated_at         = NOW() \
         WHERE id = $10",
    )
    .bind(&patch.external_id)
    .bind(&patch.address)
    .bind(&patch.phone)
    .bind(&patch.website)
    .bind(patch.rating)
    .bind(&patch.raw_hours_text)
    .bind(now)
    .bind(next_update)
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Records a recoverable transient failure: bumps `error_count` and pushes
/// `next_update` out by the backoff delay.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn record_refresh_failure(
    pool: &PgPool,
    id: i64,
    kind: &str,
    message: &str,
    now: DateTime<Utc>,
    next_update: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE place_records SET \
             last_updated       = $1, \
             next_update        = $2, \
             error_count        = error_count + 1, \
             last_error_kind    = $3, \
             last_error_message = $4, \
             updated_at         = NOW() \
         WHERE id = $5",
    )
    .bind(now)
    .bind(next_update)
    .bind(kind)
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Permanently deactivates a record the provider says does not exist.
/// The row is kept for audit; reactivation is a manual operation.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_place_record(
    pool: &PgPool,
    id: i64,
    message: &str,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE place_records SET \
             is_active          = FALSE, \
             last_updated       = $1, \
             next_update        = $1, \
             last_error_kind    = 'not_found', \
             last_error_message = $2, \
             updated_at         = NOW() \
         WHERE id = $3",
    )
    .bind(now)
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Administrative override: makes an active record immediately due by
/// clearing `next_update`, without touching its error state. This is the
/// escape hatch for records a parse-failure backoff has pushed far into
/// the future.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the restaurant has no active record, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn force_refresh(pool: &PgPool, restaurant_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE place_records SET next_update = NULL, updated_at = NOW() \
         WHERE restaurant_id = $1 AND is_active",
    )
    .bind(restaurant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> PlaceRecordRow {
        PlaceRecordRow {
            id: 1,
            restaurant_id: 42,
            name: "Nico Sushi".to_owned(),
            search_address: "123 Main St".to_owned(),
            external_id: None,
            address: None,
            phone: None,
            website: None,
            rating: None,
            raw_hours_text: None,
            canonical_schedule: None,
            timezone: Some("America/Vancouver".to_owned()),
            last_updated: None,
            next_update: None,
            error_count: 0,
            last_error_kind: None,
            last_error_message: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn hours_parsed_requires_a_schedule() {
        let mut row = sample_row();
        assert!(!row.hours_parsed());
        assert!(row.schedule().is_none());

        let schedule = WeeklySchedule::closed();
        row.canonical_schedule = Some(serde_json::to_value(&schedule).expect("serialize"));
        assert!(row.hours_parsed());
        assert_eq!(row.schedule(), Some(schedule));
    }

    #[test]
    fn corrupt_schedule_reads_as_none() {
        let mut row = sample_row();
        row.canonical_schedule = Some(serde_json::json!({"not": "a schedule"}));
        assert!(row.schedule().is_none());
    }

    #[test]
    fn tz_falls_back_to_utc() {
        let mut row = sample_row();
        assert_eq!(row.tz(), chrono_tz::America::Vancouver);
        row.timezone = Some("Not/AZone".to_owned());
        assert_eq!(row.tz(), chrono_tz::UTC);
        row.timezone = None;
        assert_eq!(row.tz(), chrono_tz::UTC);
    }
}
