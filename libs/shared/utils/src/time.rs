//! Minute-of-day and calendar helpers shared by the scheduling services.
//!
//! All interval math happens on minutes since midnight over half-open
//! `[start, end)` ranges; all calendar math happens on UTC dates with the
//! time-of-day stripped.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use shared_models::SchedulingError;

/// Parses a strict 24-hour "HH:MM" string into minutes since midnight.
///
/// Anything but two zero-padded digit pairs separated by a colon, with
/// hours 00-23 and minutes 00-59, is a validation error.
pub fn time_to_minutes(time: &str) -> Result<i64, SchedulingError> {
    let bytes = time.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit();

    if !well_formed {
        return Err(SchedulingError::validation(format!(
            "Invalid time format '{}', expected HH:MM",
            time
        )));
    }

    let hours = i64::from(bytes[0] - b'0') * 10 + i64::from(bytes[1] - b'0');
    let minutes = i64::from(bytes[3] - b'0') * 10 + i64::from(bytes[4] - b'0');

    if hours > 23 || minutes > 59 {
        return Err(SchedulingError::validation(format!(
            "Invalid time value '{}', expected 00:00-23:59",
            time
        )));
    }

    Ok(hours * 60 + minutes)
}

/// Renders minutes since midnight as a zero-padded "HH:MM" string.
///
/// Inputs must stay within a single day (0-1439); wrapping is not expected.
pub fn minutes_to_time(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` overlap iff
/// `s1 < e2 && e1 > s2`. Touching endpoints do not overlap.
pub fn ranges_overlap(s1: i64, e1: i64, s2: i64, e2: i64) -> bool {
    s1 < e2 && e1 > s2
}

/// Strips the time-of-day from a UTC timestamp, leaving the calendar date.
pub fn normalize_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// Weekday number with Sunday = 0, Saturday = 6.
pub fn weekday_number(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Every calendar date in `[start, end]` inclusive, ascending.
/// An inverted range yields an empty list.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        dates.push(cursor);
        cursor += Duration::days(1);
    }
    dates
}

/// Distinct weekday numbers present in `[start, end]` inclusive, in
/// order of first occurrence. A range of seven days or more covers all
/// seven weekdays.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> Vec<i32> {
    let mut weekdays = Vec::new();
    let mut cursor = start;
    while cursor <= end && weekdays.len() < 7 {
        let weekday = weekday_number(cursor);
        if !weekdays.contains(&weekday) {
            weekdays.push(weekday);
        }
        cursor += Duration::days(1);
    }
    weekdays
}
