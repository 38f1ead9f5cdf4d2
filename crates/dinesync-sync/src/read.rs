//! Cache-only read path.
//!
//! Directory page loads go through these functions. They answer from the
//! database alone and never contact the provider; a missing or stale record
//! degrades to "unknown" rather than triggering a synchronous fetch.

use chrono::{DateTime, Utc};

use dinesync_core::{evaluate, HoursStatus};
use dinesync_db::{DbError, PlaceRecordRow};

use crate::store::PlaceStore;

/// The cached place record for a restaurant, whatever its age.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails.
pub async fn cached_place<S>(
    store: &S,
    restaurant_id: i64,
) -> Result<Option<PlaceRecordRow>, DbError>
where
    S: PlaceStore + ?Sized,
{
    store.get(restaurant_id).await
}

/// Open/closed status for a restaurant at `now`, from the cached schedule.
///
/// Unknown when the restaurant has no record, the record carries no parsed
/// schedule, or the schedule is closed all week.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails.
pub async fn place_status<S>(
    store: &S,
    restaurant_id: i64,
    now: DateTime<Utc>,
) -> Result<HoursStatus, DbError>
where
    S: PlaceStore + ?Sized,
{
    let Some(record) = store.get(restaurant_id).await? else {
        return Ok(HoursStatus::unknown());
    };
    Ok(match record.schedule() {
        Some(schedule) => evaluate(&schedule, record.tz(), now),
        None => HoursStatus::unknown(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};

    use dinesync_core::{DayHours, StatusReason, TimeInterval, WeeklySchedule};
    use dinesync_db::PlacePatch;

    struct OneRecordStore(Option<PlaceRecordRow>);

    #[async_trait]
    impl PlaceStore for OneRecordStore {
        async fn get(&self, _restaurant_id: i64) -> Result<Option<PlaceRecordRow>, DbError> {
            Ok(self.0.clone())
        }

        async fn select_due(
            &self,
            _limit: i64,
            _now: DateTime<Utc>,
        ) -> Result<Vec<PlaceRecordRow>, DbError> {
            unimplemented!("read path never selects")
        }

        async fn select_stale(
            &self,
            _limit: i64,
            _cutoff: DateTime<Utc>,
        ) -> Result<Vec<PlaceRecordRow>, DbError> {
            unimplemented!("read path never selects")
        }

        async fn apply_refresh_success(
            &self,
            _id: i64,
            _patch: &PlacePatch,
            _now: DateTime<Utc>,
            _next_update: DateTime<Utc>,
        ) -> Result<(), DbError> {
            unimplemented!("read path never writes")
        }

        async fn apply_fields_with_parse_failure(
            &self,
            _id: i64,
            _patch: &PlacePatch,
            _message: &str,
            _now: DateTime<Utc>,
            _next_update: DateTime<Utc>,
        ) -> Result<(), DbError> {
            unimplemented!("read path never writes")
        }

        async fn record_refresh_failure(
            &self,
            _id: i64,
            _kind: &str,
            _message: &str,
            _now: DateTime<Utc>,
            _next_update: DateTime<Utc>,
        ) -> Result<(), DbError> {
            unimplemented!("read path never writes")
        }

        async fn deactivate(
            &self,
            _id: i64,
            _message: &str,
            _now: DateTime<Utc>,
        ) -> Result<(), DbError> {
            unimplemented!("read path never writes")
        }

        async fn quota_used_on(&self, _date: NaiveDate) -> Result<i64, DbError> {
            unimplemented!("read path never touches quota")
        }

        async fn add_quota_usage(&self, _date: NaiveDate, _calls: i32) -> Result<i64, DbError> {
            unimplemented!("read path never touches quota")
        }
    }

    fn record_with(schedule: Option<&WeeklySchedule>) -> PlaceRecordRow {
        let now = Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap();
        PlaceRecordRow {
            id: 1,
            restaurant_id: 42,
            name: "Nico Sushi".to_owned(),
            search_address: "123 Main St".to_owned(),
            external_id: Some("pid-1".to_owned()),
            address: None,
            phone: None,
            website: None,
            rating: None,
            raw_hours_text: None,
            canonical_schedule: schedule.map(|s| serde_json::to_value(s).unwrap()),
            timezone: Some("America/Vancouver".to_owned()),
            last_updated: Some(now),
            next_update: None,
            error_count: 0,
            last_error_kind: None,
            last_error_message: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn weekday_schedule() -> WeeklySchedule {
        let mut schedule = WeeklySchedule::closed();
        for day in [
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
        ] {
            schedule.set_day(
                day,
                DayHours::from_intervals(vec![TimeInterval {
                    open: 540,
                    close: 1020,
                }]),
            );
        }
        schedule
    }

    #[tokio::test]
    async fn missing_record_reads_as_unknown() {
        let store = OneRecordStore(None);
        let status = place_status(&store, 42, Utc::now()).await.unwrap();
        assert!(!status.is_open);
        assert_eq!(status.reason, StatusReason::Unknown);
    }

    #[tokio::test]
    async fn record_without_schedule_reads_as_unknown() {
        let store = OneRecordStore(Some(record_with(None)));
        let status = place_status(&store, 42, Utc::now()).await.unwrap();
        assert_eq!(status.reason, StatusReason::Unknown);
    }

    #[tokio::test]
    async fn status_is_evaluated_in_the_record_zone() {
        let store = OneRecordStore(Some(record_with(Some(&weekday_schedule()))));
        // Monday 10:00 in Vancouver is 17:00 UTC.
        let now = Utc.with_ymd_and_hms(2026, 8, 24, 17, 0, 0).unwrap();
        let status = place_status(&store, 42, now).await.unwrap();
        assert!(status.is_open);
    }

    #[tokio::test]
    async fn cached_read_returns_the_row_as_stored() {
        let store = OneRecordStore(Some(record_with(None)));
        let row = cached_place(&store, 42).await.unwrap().expect("record");
        assert_eq!(row.external_id.as_deref(), Some("pid-1"));
    }
}
