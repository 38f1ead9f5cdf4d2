//! Timezone-aware open/closed evaluation of a [`WeeklySchedule`].
//!
//! The schedule stores local minute-of-day intervals; this module is the one
//! place that interprets them against a real clock. Span-to-next-day
//! intervals (close < open) contribute their overflow to the following
//! calendar day, so "Monday 18:00-02:00" keeps a restaurant open at Tuesday
//! 01:00. Open boundaries are inclusive, close boundaries exclusive.

use chrono::{DateTime, Datelike, Days, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::schedule::{DayHours, WeeklySchedule, MINUTES_PER_DAY};

/// How far ahead the next-change scan looks, in days.
const SCAN_HORIZON_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    Open,
    OpenAllDay,
    Closed,
    /// No schedule, or a schedule with no open time anywhere — the caller
    /// must not present this as "closed".
    Unknown,
}

impl std::fmt::Display for StatusReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusReason::Open => "open",
            StatusReason::OpenAllDay => "open_all_day",
            StatusReason::Closed => "closed",
            StatusReason::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Result of evaluating a schedule at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoursStatus {
    pub is_open: bool,
    pub reason: StatusReason,
    /// The next instant the open/closed state flips, if one exists within
    /// the scan horizon.
    pub next_change: Option<DateTime<Utc>>,
}

impl HoursStatus {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            is_open: false,
            reason: StatusReason::Unknown,
            next_change: None,
        }
    }
}

/// Evaluates `schedule` in `tz` at `now_utc`.
///
/// A schedule with every day closed evaluates to [`StatusReason::Unknown`]:
/// the parser leaves unrecognized days closed, so an all-closed week cannot
/// be distinguished from unparsed hours.
#[must_use]
pub fn evaluate(schedule: &WeeklySchedule, tz: Tz, now_utc: DateTime<Utc>) -> HoursStatus {
    if schedule.is_all_closed() {
        return HoursStatus::unknown();
    }

    let local = now_utc.with_timezone(&tz).naive_local();
    let minute = minute_of_day(&local);
    let today = local.date();

    let is_open = open_at(schedule, today, minute);
    let reason = if is_open {
        if schedule.day(today.weekday()) == &DayHours::OpenAllDay {
            StatusReason::OpenAllDay
        } else {
            StatusReason::Open
        }
    } else {
        StatusReason::Closed
    };

    let next_change = find_next_change(schedule, tz, local, is_open);

    HoursStatus {
        is_open,
        reason,
        next_change,
    }
}

fn minute_of_day(dt: &NaiveDateTime) -> u16 {
    u16::try_from(dt.hour() * 60 + dt.minute()).unwrap_or(MINUTES_PER_DAY - 1)
}

/// State at `minute` on `date`: today's intervals plus yesterday's
/// span-to-next-day overflow.
fn open_at(schedule: &WeeklySchedule, date: chrono::NaiveDate, minute: u16) -> bool {
    match schedule.day(date.weekday()) {
        DayHours::OpenAllDay => return true,
        DayHours::Open { intervals } => {
            if intervals.iter().any(|iv| iv.contains(minute)) {
                return true;
            }
        }
        DayHours::Closed => {}
    }

    let Some(yesterday) = date.checked_sub_days(Days::new(1)) else {
        return false;
    };
    if let DayHours::Open { intervals } = schedule.day(yesterday.weekday()) {
        return intervals
            .iter()
            .any(|iv| iv.spans_midnight() && minute < iv.close);
    }
    false
}

/// Scans forward through interval and day boundaries for the first instant
/// where the open/closed state differs from `current`. Bounded at
/// [`SCAN_HORIZON_DAYS`]; open-all-week and all-closed schedules have no
/// change to find.
fn find_next_change(
    schedule: &WeeklySchedule,
    tz: Tz,
    now_local: NaiveDateTime,
    current: bool,
) -> Option<DateTime<Utc>> {
    let mut boundaries: Vec<NaiveDateTime> = Vec::new();
    // Start at yesterday so an overnight interval already in progress still
    // contributes its close boundary.
    let start = now_local.date().checked_sub_days(Days::new(1))?;

    for offset in 0..=SCAN_HORIZON_DAYS + 1 {
        let date = start.checked_add_days(Days::new(offset))?;
        // Day boundaries matter for transitions into and out of OpenAllDay
        // and overnight-overflow days.
        boundaries.push(date.and_time(NaiveTime::MIN));

        if let DayHours::Open { intervals } = schedule.day(date.weekday()) {
            for iv in intervals {
                boundaries.push(local_instant(date, iv.open)?);
                if iv.spans_midnight() || iv.close == MINUTES_PER_DAY {
                    let next = date.checked_add_days(Days::new(1))?;
                    boundaries.push(local_instant(next, iv.close % MINUTES_PER_DAY)?);
                } else {
                    boundaries.push(local_instant(date, iv.close)?);
                }
            }
        }
    }

    boundaries.sort_unstable();
    boundaries.dedup();

    for boundary in boundaries {
        if boundary <= now_local {
            continue;
        }
        let state = open_at(schedule, boundary.date(), minute_of_day(&boundary));
        if state != current {
            return local_to_utc(tz, boundary);
        }
    }
    None
}

fn local_instant(date: chrono::NaiveDate, minute: u16) -> Option<NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(u32::from(minute) / 60, u32::from(minute) % 60, 0)?;
    Some(date.and_time(time))
}

/// Resolves a local wall-clock instant to UTC. Ambiguous instants (DST
/// fall-back) take the earlier occurrence; nonexistent instants (spring-
/// forward gap) slide forward an hour.
fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    let shifted = naive.checked_add_signed(chrono::Duration::hours(1))?;
    tz.from_local_datetime(&shifted)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
