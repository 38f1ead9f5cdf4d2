use super::*;
use crate::schedule::{DayHours, TimeInterval, WeeklySchedule};
use chrono::Weekday;

fn open_day(ranges: &[(u16, u16)]) -> DayHours {
    DayHours::Open {
        intervals: ranges
            .iter()
            .map(|&(open, close)| TimeInterval::new(open, close))
            .collect(),
    }
}

fn weekday_nine_to_five() -> WeeklySchedule {
    let mut schedule = WeeklySchedule::closed();
    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ] {
        schedule.set_day(day, open_day(&[(540, 1020)]));
    }
    schedule
}

#[test]
fn parses_one_line_per_day_with_meridiem() {
    let text = "Monday: 9:00 AM - 5:00 PM\nTuesday: 11:30 AM - 10:00 PM";
    let schedule = parse_hours(text).expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(540, 1020)]));
    assert_eq!(schedule.day(Weekday::Tue), &open_day(&[(690, 1320)]));
    assert_eq!(schedule.day(Weekday::Wed), &DayHours::Closed);
}

#[test]
fn parses_compact_abbreviated_entries() {
    let schedule = parse_hours("Mon 9AM-5PM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(540, 1020)]));
}

#[test]
fn parses_day_ranges_inclusively() {
    let schedule = parse_hours("Mon-Fri 9AM-5PM").expect("should parse");
    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ] {
        assert_eq!(schedule.day(day), &open_day(&[(540, 1020)]), "{day}");
    }
    assert_eq!(schedule.day(Weekday::Sat), &DayHours::Closed);
}

#[test]
fn parses_day_range_wrapping_the_week() {
    let schedule = parse_hours("Fri-Mon 10AM-2PM").expect("should parse");
    for day in [Weekday::Fri, Weekday::Sat, Weekday::Sun, Weekday::Mon] {
        assert_eq!(schedule.day(day), &open_day(&[(600, 840)]), "{day}");
    }
    assert_eq!(schedule.day(Weekday::Tue), &DayHours::Closed);
}

#[test]
fn parses_military_time() {
    let schedule = parse_hours("Mon 09:00-17:00").expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(540, 1020)]));
}

#[test]
fn parses_open_all_day() {
    let schedule = parse_hours("Saturday: Open 24 hours").expect("should parse");
    assert_eq!(schedule.day(Weekday::Sat), &DayHours::OpenAllDay);
}

#[test]
fn dayless_open_24_hours_covers_the_whole_week() {
    let schedule = parse_hours("Open 24 hours").expect("should parse");
    for day in &schedule.days {
        assert_eq!(day, &DayHours::OpenAllDay);
    }
}

#[test]
fn parses_explicit_closed() {
    let schedule = parse_hours("Mon 9AM-5PM\nSunday: Closed").expect("should parse");
    assert_eq!(schedule.day(Weekday::Sun), &DayHours::Closed);
}

#[test]
fn equivalent_formats_parse_identically() {
    // The same logical schedule through four textual shapes.
    let variants = [
        "Mon-Fri 9AM-5PM, Sat-Sun closed",
        "Monday to Friday 9:00 AM - 5:00 PM\nSaturday: Closed\nSunday: Closed",
        "Mon-Fri 09:00-17:00",
        "Monday: 9am-5pm; Tuesday: 9am-5pm; Wednesday: 9am-5pm; \
         Thursday: 9am-5pm; Friday: 9am-5pm",
    ];
    let expected = weekday_nine_to_five();
    for text in variants {
        assert_eq!(
            parse_hours(text).expect("should parse"),
            expected,
            "variant: {text}"
        );
    }
}

#[test]
fn last_occurrence_of_a_day_wins() {
    let text = "Monday: 9AM-5PM\nMonday: 10AM-4PM";
    let schedule = parse_hours(text).expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(600, 960)]));
}

#[test]
fn unrecognized_lines_are_skipped_not_fatal() {
    let text = "Hours may vary on holidays\nMon 9AM-5PM";
    let schedule = parse_hours(text).expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(540, 1020)]));
}

#[test]
fn zero_parsed_lines_is_an_error_not_an_empty_schedule() {
    let err = parse_hours("call for hours").expect_err("nothing parseable");
    assert!(matches!(err, HoursParseError::Unrecognized { .. }));
}

#[test]
fn empty_text_is_an_error() {
    assert!(matches!(parse_hours("   "), Err(HoursParseError::Empty)));
}

#[test]
fn parses_overnight_span() {
    let schedule = parse_hours("Mon 6PM-2AM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(1080, 120)]));
}

#[test]
fn parses_overnight_military_span() {
    let schedule = parse_hours("Fri 18:00-02:00").expect("should parse");
    assert_eq!(schedule.day(Weekday::Fri), &open_day(&[(1080, 120)]));
}

#[test]
fn parses_split_shifts_on_one_day() {
    let schedule = parse_hours("Tue 11:30AM-2:30PM, 5PM-10PM").expect("should parse");
    assert_eq!(
        schedule.day(Weekday::Tue),
        &open_day(&[(690, 870), (1020, 1320)])
    );
}

#[test]
fn comma_separated_day_entries_split_correctly() {
    let schedule = parse_hours("Mon-Fri 9AM-5PM, Sat 10AM-2PM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Fri), &open_day(&[(540, 1020)]));
    assert_eq!(schedule.day(Weekday::Sat), &open_day(&[(600, 840)]));
}

#[test]
fn comma_separated_day_list_shares_hours() {
    let schedule = parse_hours("Mon, Wed 9AM-5PM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(540, 1020)]));
    assert_eq!(schedule.day(Weekday::Wed), &open_day(&[(540, 1020)]));
    assert_eq!(schedule.day(Weekday::Tue), &DayHours::Closed);
}

#[test]
fn bare_meridiem_on_close_side_is_borrowed() {
    let schedule = parse_hours("Mon 11-2pm").expect("should parse");
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(660, 840)]));
}

#[test]
fn daily_keyword_covers_every_day() {
    let schedule = parse_hours("Daily 8AM-8PM").expect("should parse");
    for day in &schedule.days {
        assert_eq!(day, &open_day(&[(480, 1200)]));
    }
}

#[test]
fn ampersand_day_pair() {
    let schedule = parse_hours("Sat & Sun 10AM-3PM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Sat), &open_day(&[(600, 900)]));
    assert_eq!(schedule.day(Weekday::Sun), &open_day(&[(600, 900)]));
    assert_eq!(schedule.day(Weekday::Fri), &DayHours::Closed);
}

#[test]
fn malformed_range_does_not_discard_its_siblings() {
    // "17PM" is nonsense in 12-hour time; the lunch sitting must survive.
    let schedule = parse_hours("Tue 11AM-2PM, 17PM-22PM").expect("should parse");
    assert_eq!(schedule.day(Weekday::Tue), &open_day(&[(660, 840)]));
}

#[test]
fn noon_and_midnight_hours_convert_correctly() {
    let schedule = parse_hours("Mon 12PM-12AM").expect("should parse");
    // Noon to midnight: close of 12 AM is minute 0, a span to the day boundary.
    assert_eq!(schedule.day(Weekday::Mon), &open_day(&[(720, 0)]));
}

#[test]
fn unicode_dashes_are_normalized() {
    let schedule = parse_hours("Mon\u{2013}Fri 9am\u{2013}5pm").expect("should parse");
    assert_eq!(schedule.day(Weekday::Wed), &open_day(&[(540, 1020)]));
}
