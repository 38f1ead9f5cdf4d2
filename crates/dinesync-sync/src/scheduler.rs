//! Batch refresh scheduler.
//!
//! One [`run_batch`] call selects due records, refreshes them sequentially
//! with a fixed inter-request delay, and classifies every outcome. Quota is
//! checked against the database before each record and persisted after each
//! upstream call, so overlapping invocations stay under the shared daily cap.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use dinesync_core::{next_delay, parse_hours, AppConfig, BackoffConfig, RefreshErrorKind};
use dinesync_db::{DbError, PlacePatch, PlaceRecordRow, RunCounts};
use dinesync_places::PlacesError;

use crate::store::PlaceStore;
use crate::upstream::UpstreamSource;

/// Tunables for one batch invocation.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum records to select.
    pub batch_size: i64,
    /// Pause between consecutive records.
    pub inter_request_delay: StdDuration,
    /// Daily cap on upstream calls, shared across invocations.
    pub daily_quota: i64,
    /// Zone whose local midnight resets the quota counter.
    pub quota_tz: chrono_tz::Tz,
    pub backoff: BackoffConfig,
    /// Select by `last_updated` age instead of `next_update`, reaching
    /// records a backoff has pushed far into the future.
    pub days_threshold: Option<i64>,
    /// List what would be refreshed without calling upstream or writing.
    pub dry_run: bool,
}

impl BatchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: i64::try_from(config.batch_size).unwrap_or(i64::MAX),
            inter_request_delay: StdDuration::from_millis(config.inter_request_delay_ms),
            daily_quota: i64::from(config.daily_quota),
            quota_tz: config.quota_tz,
            backoff: config.backoff(),
            days_threshold: None,
            dry_run: false,
        }
    }
}

/// Per-outcome counters for one batch invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
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

impl BatchReport {
    /// The counters in the shape the `refresh_runs` table persists.
    #[must_use]
    pub fn run_counts(&self) -> RunCounts {
        RunCounts {
            selected: self.selected,
            updated: self.updated,
            not_found: self.not_found,
            parse_failed: self.parse_failed,
            rate_limited: self.rate_limited,
            transport_failed: self.transport_failed,
            skipped: self.skipped,
            upstream_calls: self.upstream_calls,
            quota_exceeded: self.quota_exceeded,
        }
    }
}

/// Selects and refreshes one batch of records.
///
/// Records are processed strictly in selection order. A record without a
/// provider id costs two upstream calls (search, then details); one with a
/// cached id costs one. When the remaining quota cannot cover the next
/// record's worst case, the rest of the batch is skipped and the report is
/// flagged `quota_exceeded`.
///
/// Upstream and parse failures are classified and written back per record;
/// only database errors abort the batch.
///
/// # Errors
///
/// Returns [`DbError`] if selection, a write-back, or quota accounting fails.
pub async fn run_batch<S, U>(
    store: &S,
    upstream: &U,
    config: &BatchConfig,
    now: DateTime<Utc>,
) -> Result<BatchReport, DbError>
where
    S: PlaceStore + ?Sized,
    U: UpstreamSource + ?Sized,
{
    let records = match config.days_threshold {
        Some(days) => {
            let cutoff = now - Duration::days(days);
            store.select_stale(config.batch_size, cutoff).await?
        }
        None => store.select_due(config.batch_size, now).await?,
    };

    let mut report = BatchReport {
        selected: i32::try_from(records.len()).unwrap_or(i32::MAX),
        ..BatchReport::default()
    };

    if config.dry_run {
        for record in &records {
            tracing::info!(
                restaurant_id = record.restaurant_id,
                name = %record.name,
                next_update = ?record.next_update,
                error_count = record.error_count,
                "dry-run: would refresh"
            );
        }
        return Ok(report);
    }

    let quota_date = now.with_timezone(&config.quota_tz).date_naive();

    for (index, record) in records.iter().enumerate() {
        // Worst case for this record: a search call plus a details call.
        let calls_needed = 1 + i64::from(record.external_id.is_none());
        let used = store.quota_used_on(quota_date).await?;
        if used + calls_needed > config.daily_quota {
            let remaining = records.len() - index;
            report.skipped = i32::try_from(remaining).unwrap_or(i32::MAX);
            report.quota_exceeded = true;
            tracing::warn!(
                used,
                daily_quota = config.daily_quota,
                skipped = remaining,
                "daily quota exhausted, stopping batch"
            );
            break;
        }

        refresh_record(store, upstream, config, record, now, quota_date, &mut report).await?;

        if index + 1 < records.len() && !config.inter_request_delay.is_zero() {
            tokio::time::sleep(config.inter_request_delay).await;
        }
    }

    Ok(report)
}

/// Refreshes a single record and records its outcome.
async fn refresh_record<S, U>(
    store: &S,
    upstream: &U,
    config: &BatchConfig,
    record: &PlaceRecordRow,
    now: DateTime<Utc>,
    quota_date: chrono::NaiveDate,
    report: &mut BatchReport,
) -> Result<(), DbError>
where
    S: PlaceStore + ?Sized,
    U: UpstreamSource + ?Sized,
{
    let mut patch = PlacePatch::default();

    let external_id = match &record.external_id {
        Some(id) => id.clone(),
        None => {
            let result = upstream.search(&record.name, &record.search_address).await;
            report.upstream_calls += 1;
            store.add_quota_usage(quota_date, 1).await?;
            match result {
                Ok(Some(id)) => {
                    patch.external_id = Some(id.clone());
                    id
                }
                Ok(None) => {
                    tracing::info!(
                        restaurant_id = record.restaurant_id,
                        name = %record.name,
                        "no provider match, deactivating record"
                    );
                    store
                        .deactivate(record.id, "no provider match for search", now)
                        .await?;
                    report.not_found += 1;
                    return Ok(());
                }
                Err(err) => {
                    return write_upstream_failure(store, config, record, &err, now, report).await;
                }
            }
        }
    };

    let details = match upstream.fetch_details(&external_id).await {
        Ok(details) => details,
        Err(err) => {
            report.upstream_calls += 1;
            store.add_quota_usage(quota_date, 1).await?;
            return write_upstream_failure(store, config, record, &err, now, report).await;
        }
    };
    report.upstream_calls += 1;
    store.add_quota_usage(quota_date, 1).await?;

    // Empty strings count as absent; they must not blank a cached value.
    patch.address = details.formatted_address.clone().filter(|s| !s.is_empty());
    patch.phone = details
        .formatted_phone_number
        .clone()
        .filter(|s| !s.is_empty());
    patch.website = details.website.clone().filter(|s| !s.is_empty());
    patch.rating = details.rating;

    if let Some(hours_text) = details.hours_text() {
        patch.raw_hours_text = Some(hours_text.clone());
        match parse_hours(&hours_text) {
            Ok(schedule) => {
                patch.canonical_schedule = serde_json::to_value(&schedule).ok();
            }
            Err(err) => {
                let error_count = u32::try_from(record.error_count).unwrap_or(0);
                let delay = next_delay(error_count, RefreshErrorKind::ParseFailure, &config.backoff);
                tracing::warn!(
                    restaurant_id = record.restaurant_id,
                    error = %err,
                    error_count = error_count + 1,
                    retry_in_days = delay.num_days(),
                    "hours text did not parse, keeping cached schedule"
                );
                store
                    .apply_fields_with_parse_failure(
                        record.id,
                        &patch,
                        &err.to_string(),
                        now,
                        now + delay,
                    )
                    .await?;
                report.parse_failed += 1;
                return Ok(());
            }
        }
    }

    store
        .apply_refresh_success(record.id, &patch, now, now + config.backoff.base_ttl)
        .await?;
    report.updated += 1;
    tracing::debug!(
        restaurant_id = record.restaurant_id,
        hours = patch.canonical_schedule.is_some(),
        "record refreshed"
    );
    Ok(())
}

/// Writes back a classified upstream failure. `NotFound` deactivates the
/// record; everything else bumps the error count and schedules a retry.
async fn write_upstream_failure<S>(
    store: &S,
    config: &BatchConfig,
    record: &PlaceRecordRow,
    err: &PlacesError,
    now: DateTime<Utc>,
    report: &mut BatchReport,
) -> Result<(), DbError>
where
    S: PlaceStore + ?Sized,
{
    let kind = err.kind();
    if kind == RefreshErrorKind::NotFound {
        tracing::info!(
            restaurant_id = record.restaurant_id,
            error = %err,
            "provider reports place gone, deactivating record"
        );
        store.deactivate(record.id, &err.to_string(), now).await?;
        report.not_found += 1;
        return Ok(());
    }

    let error_count = u32::try_from(record.error_count).unwrap_or(0);
    let delay = next_delay(error_count, kind, &config.backoff);
    tracing::warn!(
        restaurant_id = record.restaurant_id,
        kind = kind.as_str(),
        error = %err,
        retry_in_hours = delay.num_hours(),
        "upstream refresh failed"
    );
    store
        .record_refresh_failure(record.id, kind.as_str(), &err.to_string(), now, now + delay)
        .await?;
    match kind {
        RefreshErrorKind::RateLimited => report.rate_limited += 1,
        _ => report.transport_failed += 1,
    }
    Ok(())
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
