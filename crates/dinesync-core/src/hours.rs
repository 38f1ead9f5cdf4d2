//! Free-text hours-of-operation parser.
//!
//! Upstream hours text arrives in many shapes: one line per day
//! (`"Monday: 9:00 AM - 5:00 PM"`), compact entries (`"Mon 9AM-5PM"`), day
//! ranges (`"Mon-Fri 9AM-5PM"`), 24-hour time (`"09:00-17:00"`), and the
//! keywords `"Closed"` and `"Open 24 hours"`. The parser is an ordered set of
//! small matchers — day spec, closed, all-day, time ranges — composed per
//! entry. Unrecognized entries are skipped (the day stays `Closed`); only a
//! text where *nothing* parses is an error, so callers can always tell
//! "known closed" apart from "unknown".
//!
//! If the same day appears more than once, the last occurrence wins — hours
//! text is typically authored with corrections appended at the end.

use chrono::Weekday;
use regex::Regex;
use thiserror::Error;

use crate::schedule::{DayHours, TimeInterval, WeeklySchedule, MINUTES_PER_DAY};

#[derive(Debug, Error)]
pub enum HoursParseError {
    #[error("hours text is empty")]
    Empty,
    #[error("no recognizable hours entries in {text:?}")]
    Unrecognized { text: String },
}

/// Parses free-text hours into a [`WeeklySchedule`].
///
/// # Errors
///
/// Returns [`HoursParseError::Empty`] for blank input and
/// [`HoursParseError::Unrecognized`] when not a single entry parses. A
/// partially-parseable text succeeds with unparsed days left `Closed`.
pub fn parse_hours(raw: &str) -> Result<WeeklySchedule, HoursParseError> {
    let normalized = raw.replace(['\u{2013}', '\u{2014}'], "-");
    if normalized.trim().is_empty() {
        return Err(HoursParseError::Empty);
    }

    let mut schedule = WeeklySchedule::closed();
    let mut parsed_any = false;

    for entry in split_entries(&normalized) {
        let Some((days, hours)) = parse_entry(&entry) else {
            tracing_skip(&entry);
            continue;
        };
        for day in days {
            schedule.set_day(day, hours.clone());
        }
        parsed_any = true;
    }

    if parsed_any {
        Ok(schedule)
    } else {
        Err(HoursParseError::Unrecognized {
            text: raw.to_owned(),
        })
    }
}

fn tracing_skip(entry: &str) {
    tracing::debug!(entry, "skipping unrecognized hours entry");
}

// ---------------------------------------------------------------------------
// Entry splitting
// ---------------------------------------------------------------------------

/// Splits raw text into per-day entries.
///
/// Newlines, `;`, and `|` always separate entries. Commas separate entries
/// only when the next segment starts a new day spec — otherwise they belong
/// to the current entry (day lists like `"Mon, Wed"` and second sittings like
/// `"9am-2pm, 5pm-10pm"`).
fn split_entries(text: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in text.split(['\n', ';', '|']) {
        // Continuation parts only ever merge into an entry from the same
        // line; a day-less line stands alone and gets skipped by the parser.
        let mut line_entry: Option<usize> = None;
        for part in line.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            match line_entry {
                // Merge when the part continues the current entry (second
                // sitting) or when the current entry is still a bare day
                // list ("Mon, Wed 9AM-5PM").
                Some(idx) if !starts_new_entry(trimmed) || !has_hours_content(&entries[idx]) => {
                    entries[idx].push_str(", ");
                    entries[idx].push_str(trimmed);
                }
                _ => {
                    entries.push(trimmed.to_owned());
                    line_entry = Some(entries.len() - 1);
                }
            }
        }
    }
    entries
}

fn has_hours_content(entry: &str) -> bool {
    let lowered = entry.to_lowercase();
    lowered.contains(|c: char| c.is_ascii_digit()) || lowered.contains("closed")
}

fn starts_new_entry(part: &str) -> bool {
    let Some(first) = part.split_whitespace().next() else {
        return false;
    };
    let lowered = first.to_lowercase();
    if lowered == "open" {
        return true;
    }
    matches!(
        parse_day_token(&lowered),
        Some(DayToken::Day(_) | DayToken::Range(_, _) | DayToken::Daily)
    )
}

// ---------------------------------------------------------------------------
// Entry parsing
// ---------------------------------------------------------------------------

/// Parses one entry into the weekdays it covers and their hours.
/// Returns `None` when the entry is unrecognizable.
fn parse_entry(entry: &str) -> Option<(Vec<Weekday>, DayHours)> {
    let tokens: Vec<&str> = entry.split_whitespace().collect();
    let (days, consumed) = match_day_spec(&tokens);
    let rest = tokens[consumed..].join(" ");

    // A day-less "Open 24 hours" applies to the whole week.
    let days = if days.is_empty() {
        if match_all_day(&rest) {
            all_week()
        } else {
            return None;
        }
    } else {
        days
    };

    let hours = match_hours(&rest)?;
    Some((days, hours))
}

/// Ordered hours matchers: closed, all-day, then time ranges.
fn match_hours(rest: &str) -> Option<DayHours> {
    if match_closed(rest) {
        return Some(DayHours::Closed);
    }
    if match_all_day(rest) {
        return Some(DayHours::OpenAllDay);
    }
    match_time_ranges(rest).map(DayHours::from_intervals)
}

fn match_closed(rest: &str) -> bool {
    rest.trim().to_lowercase().starts_with("closed")
}

fn match_all_day(rest: &str) -> bool {
    let lowered = rest.to_lowercase();
    lowered.contains("24 hour")
        || lowered.contains("24hr")
        || lowered.contains("24-hour")
        || lowered.contains("24/7")
        || lowered.contains("all day")
}

// ---------------------------------------------------------------------------
// Day-spec matcher
// ---------------------------------------------------------------------------

enum DayToken {
    Day(usize),
    Range(usize, usize),
    /// Range connectors: "to", "-", "thru".
    RangeSep,
    /// List connectors: "&", "and".
    ListSep,
    Daily,
}

/// Consumes leading day tokens and returns the covered weekdays plus the
/// number of tokens consumed. A leading `"Open"` is skipped so that
/// `"Open Mon-Fri 9am-5pm"` parses the same as `"Mon-Fri 9am-5pm"`.
fn match_day_spec(tokens: &[&str]) -> (Vec<Weekday>, usize) {
    let mut days: Vec<usize> = Vec::new();
    let mut consumed = 0;
    let mut range_pending = false;

    for (i, tok) in tokens.iter().enumerate() {
        let lowered = tok.to_lowercase();
        if i == 0 && lowered == "open" {
            consumed = 1;
            continue;
        }
        match parse_day_token(&lowered) {
            Some(DayToken::Day(d)) => {
                if range_pending {
                    if let Some(&start) = days.last() {
                        extend_range(&mut days, start, d);
                    }
                    range_pending = false;
                } else {
                    days.push(d);
                }
                consumed = i + 1;
            }
            Some(DayToken::Range(a, b)) => {
                days.push(a);
                extend_range(&mut days, a, b);
                consumed = i + 1;
            }
            Some(DayToken::RangeSep) => {
                if days.is_empty() {
                    break;
                }
                range_pending = true;
                consumed = i + 1;
            }
            Some(DayToken::ListSep) => {
                if days.is_empty() {
                    break;
                }
                consumed = i + 1;
            }
            Some(DayToken::Daily) => {
                days.extend(0..7);
                consumed = i + 1;
            }
            None => break,
        }
    }

    days.sort_unstable();
    days.dedup();
    let weekdays = days.into_iter().map(weekday_from_index).collect();
    (weekdays, consumed)
}

/// Appends the days after `start` up to and including `end`, wrapping across
/// the week so `"Fri-Mon"` covers Fri, Sat, Sun, Mon.
fn extend_range(days: &mut Vec<usize>, start: usize, end: usize) {
    let mut d = start;
    while d != end {
        d = (d + 1) % 7;
        days.push(d);
    }
}

fn parse_day_token(token: &str) -> Option<DayToken> {
    let trimmed = token.trim_matches(|c: char| matches!(c, ':' | ',' | '.'));
    match trimmed {
        "to" | "-" | "thru" | "through" => return Some(DayToken::RangeSep),
        "&" | "and" => return Some(DayToken::ListSep),
        "daily" | "everyday" => return Some(DayToken::Daily),
        _ => {}
    }
    if let Some((a, b)) = trimmed.split_once('-') {
        let start = day_index(a)?;
        let end = day_index(b)?;
        return Some(DayToken::Range(start, end));
    }
    day_index(trimmed).map(DayToken::Day)
}

/// Monday-origin index for a day word; accepts full names and the common
/// abbreviations.
fn day_index(word: &str) -> Option<usize> {
    match word {
        "mon" | "monday" => Some(0),
        "tue" | "tues" | "tuesday" => Some(1),
        "wed" | "weds" | "wednesday" => Some(2),
        "thu" | "thur" | "thurs" | "thursday" => Some(3),
        "fri" | "friday" => Some(4),
        "sat" | "saturday" => Some(5),
        "sun" | "sunday" => Some(6),
        _ => None,
    }
}

fn weekday_from_index(index: usize) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

fn all_week() -> Vec<Weekday> {
    (0..7).map(weekday_from_index).collect()
}

// ---------------------------------------------------------------------------
// Time-range matcher
// ---------------------------------------------------------------------------

/// Extracts every `open-close` time range from the remainder of an entry.
/// Returns `None` when no range is present. A malformed range is dropped on
/// its own; valid sibling ranges on the same entry survive.
fn match_time_ranges(rest: &str) -> Option<Vec<TimeInterval>> {
    let range_re = Regex::new(
        r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?\s*(?:-|to|until)\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?",
    )
    .expect("valid time-range regex");

    let intervals: Vec<TimeInterval> = range_re
        .captures_iter(rest)
        .filter_map(|caps| interval_from_captures(&caps))
        .collect();

    if intervals.is_empty() {
        None
    } else {
        Some(intervals)
    }
}

fn interval_from_captures(caps: &regex::Captures<'_>) -> Option<TimeInterval> {
    let open_hour: u16 = caps[1].parse().ok()?;
    let open_min: u16 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let open_mer = caps.get(3).map(|m| meridiem(m.as_str()));
    let close_hour: u16 = caps[4].parse().ok()?;
    let close_min: u16 = caps.get(5).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let close_mer = caps.get(6).map(|m| meridiem(m.as_str()));

    let (open, close) = resolve_range(
        (open_hour, open_min, open_mer),
        (close_hour, close_min, close_mer),
        caps.get(2).is_some() || caps.get(5).is_some(),
    )?;
    if open == close {
        return None;
    }
    Some(TimeInterval::new(open, close))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn meridiem(s: &str) -> Meridiem {
    if s.to_lowercase().starts_with('p') {
        Meridiem::Pm
    } else {
        Meridiem::Am
    }
}

/// Resolves a raw `(hour, minute, meridiem)` pair into open/close minutes.
///
/// When only one side carries an AM/PM marker, the bare side borrows the
/// marked side's meridiem if that yields a forward interval, otherwise the
/// opposite one — so `"11-2pm"` reads as 11 AM-2 PM and `"9am-5"` as
/// 9 AM-5 PM. Bare `"9-5"` (no markers, no minutes) assumes a daytime
/// span rather than an overnight one.
fn resolve_range(
    open: (u16, u16, Option<Meridiem>),
    close: (u16, u16, Option<Meridiem>),
    any_explicit_minutes: bool,
) -> Option<(u16, u16)> {
    let (oh, om, omer) = open;
    let (ch, cm, cmer) = close;
    if om >= 60 || cm >= 60 {
        return None;
    }

    match (omer, cmer) {
        (Some(a), Some(b)) => Some((twelve_hour(oh, om, a)?, twelve_hour(ch, cm, b)?)),
        (None, None) => {
            let open_m = twenty_four_hour(oh, om, false)?;
            let mut close_m = twenty_four_hour(ch, cm, true)?;
            // "9-5" with no markers and no minutes is a daytime range, not an
            // overnight one. "18:00-02:00" keeps its explicit overnight span.
            if !any_explicit_minutes && close_m < open_m && ch <= 12 {
                close_m += 12 * 60;
            }
            Some((open_m, close_m))
        }
        (None, Some(b)) => {
            let close_m = twelve_hour(ch, cm, b)?;
            let same = twelve_hour(oh, om, b)?;
            if same < close_m {
                Some((same, close_m))
            } else {
                let flipped = match b {
                    Meridiem::Pm => Meridiem::Am,
                    Meridiem::Am => Meridiem::Pm,
                };
                Some((twelve_hour(oh, om, flipped)?, close_m))
            }
        }
        (Some(a), None) => {
            let open_m = twelve_hour(oh, om, a)?;
            let same = twelve_hour(ch, cm, a)?;
            if open_m < same {
                Some((open_m, same))
            } else {
                let flipped = match a {
                    Meridiem::Am => Meridiem::Pm,
                    Meridiem::Pm => Meridiem::Am,
                };
                Some((open_m, twelve_hour(ch, cm, flipped)?))
            }
        }
    }
}

fn twelve_hour(hour: u16, minute: u16, mer: Meridiem) -> Option<u16> {
    if hour == 0 || hour > 12 {
        return None;
    }
    let base = (hour % 12) * 60 + minute;
    Some(match mer {
        Meridiem::Am => base,
        Meridiem::Pm => base + 12 * 60,
    })
}

/// 24-hour clock conversion. `24:00` is accepted as a close time only.
fn twenty_four_hour(hour: u16, minute: u16, is_close: bool) -> Option<u16> {
    let minutes = hour * 60 + minute;
    if hour < 24 {
        Some(minutes)
    } else if hour == 24 && minute == 0 && is_close {
        Some(MINUTES_PER_DAY)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "hours_test.rs"]
mod tests;
