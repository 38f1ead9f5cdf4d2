//! Canonical weekly-schedule model produced by the hours parser.
//!
//! A schedule holds exactly seven day slots, Monday through Sunday. Each slot
//! is closed, open all day, or an ordered list of minute-resolution local-time
//! intervals. An interval whose close is numerically below its open spans
//! midnight into the next day; interpreting that overflow is the status
//! evaluator's job, not the schedule's.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A single open/close interval in local minutes from midnight.
///
/// The open boundary is inclusive and the close boundary exclusive, so
/// `540..1020` (09:00–17:00) is closed at exactly 17:00. `close < open`
/// denotes a span-to-next-day interval such as 18:00–02:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub open: u16,
    pub close: u16,
}

impl TimeInterval {
    #[must_use]
    pub fn new(open: u16, close: u16) -> Self {
        Self { open, close }
    }

    /// True when the interval's close falls on the following calendar day.
    #[must_use]
    pub fn spans_midnight(self) -> bool {
        self.close < self.open
    }

    /// Same-day containment check. For a spanning interval this covers only
    /// the portion from `open` to midnight; the overflow into the next day
    /// is handled by the evaluator.
    #[must_use]
    pub fn contains(self, minute: u16) -> bool {
        if self.spans_midnight() {
            minute >= self.open
        } else {
            minute >= self.open && minute < self.close
        }
    }
}

/// Hours for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayHours {
    Closed,
    OpenAllDay,
    Open { intervals: Vec<TimeInterval> },
}

impl DayHours {
    /// Builds an `Open` slot from intervals, collapsing the degenerate cases:
    /// an empty list becomes `Closed` and a single full-day interval becomes
    /// `OpenAllDay`.
    #[must_use]
    pub fn from_intervals(mut intervals: Vec<TimeInterval>) -> Self {
        intervals.retain(|iv| iv.open != iv.close);
        if intervals.is_empty() {
            return DayHours::Closed;
        }
        if intervals.len() == 1 && intervals[0].open == 0 && intervals[0].close == MINUTES_PER_DAY {
            return DayHours::OpenAllDay;
        }
        intervals.sort_by_key(|iv| iv.open);
        DayHours::Open { intervals }
    }
}

/// Canonical parsed form of a restaurant's weekly hours.
///
/// Index 0 is Monday, index 6 is Sunday, matching
/// [`chrono::Weekday::num_days_from_monday`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [DayHours; 7],
}

impl WeeklySchedule {
    /// A schedule with every day closed. The parser uses this as the starting
    /// point; it is never returned to callers unless at least one line parsed.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            days: std::array::from_fn(|_| DayHours::Closed),
        }
    }

    #[must_use]
    pub fn day(&self, weekday: Weekday) -> &DayHours {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set_day(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = hours;
    }

    /// True when no day has any open time. Callers treat this the same as an
    /// absent schedule (status `unknown`) since the parser's skip-to-closed
    /// default makes it indistinguishable from unparsed input.
    #[must_use]
    pub fn is_all_closed(&self) -> bool {
        self.days.iter().all(|d| matches!(d, DayHours::Closed))
    }
}
