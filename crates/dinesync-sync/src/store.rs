//! Persistence seam for the refresh scheduler.
//!
//! [`PlaceStore`] is the narrow slice of the database the scheduler needs.
//! [`PgPlaceStore`] forwards to the `dinesync-db` functions; tests substitute
//! an in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use dinesync_db::{DbError, PlacePatch, PlaceRecordRow};

/// Scheduler-facing view of the `place_records` and `quota_usage` tables.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Fetches the cached record for a restaurant, if one exists.
    async fn get(&self, restaurant_id: i64) -> Result<Option<PlaceRecordRow>, DbError>;

    /// Active records due for refresh at `now`, never-attempted first.
    async fn select_due(
        &self,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<PlaceRecordRow>, DbError>;

    /// Active records last refreshed before `cutoff`, ignoring `next_update`.
    async fn select_stale(
        &self,
        limit: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PlaceRecordRow>, DbError>;

    /// Applies a successful refresh and schedules the next one.
    async fn apply_refresh_success(
        &self,
        id: i64,
        patch: &PlacePatch,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError>;

    /// Applies the field patch from a response whose hours failed to parse.
    async fn apply_fields_with_parse_failure(
        &self,
        id: i64,
        patch: &PlacePatch,
        message: &str,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError>;

    /// Records a transient failure and pushes the next attempt out.
    async fn record_refresh_failure(
        &self,
        id: i64,
        kind: &str,
        message: &str,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError>;

    /// Deactivates a record the provider says does not exist.
    async fn deactivate(&self, id: i64, message: &str, now: DateTime<Utc>)
        -> Result<(), DbError>;

    /// Upstream calls already consumed on `date`.
    async fn quota_used_on(&self, date: NaiveDate) -> Result<i64, DbError>;

    /// Adds `calls` to the day's quota counter, returning the new total.
    async fn add_quota_usage(&self, date: NaiveDate, calls: i32) -> Result<i64, DbError>;
}

/// The production [`PlaceStore`], backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgPlaceStore {
    pool: PgPool,
}

impl PgPlaceStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaceStore for PgPlaceStore {
    async fn get(&self, restaurant_id: i64) -> Result<Option<PlaceRecordRow>, DbError> {
        dinesync_db::get_place_record(&self.pool, restaurant_id).await
    }

    async fn select_due(
        &self,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<PlaceRecordRow>, DbError> {
        dinesync_db::select_due(&self.pool, limit, now).await
    }

    async fn select_stale(
        &self,
        limit: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PlaceRecordRow>, DbError> {
        dinesync_db::select_stale(&self.pool, limit, cutoff).await
    }

    async fn apply_refresh_success(
        &self,
        id: i64,
        patch: &PlacePatch,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError> {
        dinesync_db::apply_refresh_success(&self.pool, id, patch, now, next_update).await
    }

    async fn apply_fields_with_parse_failure(
        &self,
        id: i64,
        patch: &PlacePatch,
        message: &str,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError> {
        dinesync_db::apply_fields_with_parse_failure(&self.pool, id, patch, message, now, next_update)
            .await
    }

    async fn record_refresh_failure(
        &self,
        id: i64,
        kind: &str,
        message: &str,
        now: DateTime<Utc>,
        next_update: DateTime<Utc>,
    ) -> Result<(), DbError> {
        dinesync_db::record_refresh_failure(&self.pool, id, kind, message, now, next_update).await
    }

    async fn deactivate(
        &self,
        id: i64,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        dinesync_db::deactivate_place_record(&self.pool, id, message, now).await
    }

    async fn quota_used_on(&self, date: NaiveDate) -> Result<i64, DbError> {
        dinesync_db::quota_used_on(&self.pool, date).await
    }

    async fn add_quota_usage(&self, date: NaiveDate, calls: i32) -> Result<i64, DbError> {
        dinesync_db::add_quota_usage(&self.pool, date, calls).await
    }
}
