//! Wall-clock minute arithmetic.
//!
//! All schedule math works in whole minutes since midnight, matching the
//! resolution of the external timesheet systems. Additions wrap at
//! midnight so a malformed config cannot panic the core.

use chrono::{NaiveTime, Timelike};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minute-of-day for a wall-clock time (seconds truncated).
pub fn minute_of_day(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight()) / 60
}

/// Signed difference `later - earlier` in minutes.
pub fn minutes_between(later: NaiveTime, earlier: NaiveTime) -> i64 {
    minute_of_day(later) - minute_of_day(earlier)
}

/// Add (or subtract) minutes to a wall-clock time, wrapping at midnight.
pub fn add_minutes(t: NaiveTime, delta: i64) -> NaiveTime {
    let total = (minute_of_day(t) + delta).rem_euclid(MINUTES_PER_DAY);
    from_minute_of_day(total)
}

/// Build a time from a minute-of-day value (already in [0, 1440)).
pub fn from_minute_of_day(minutes: i64) -> NaiveTime {
    let m = minutes.rem_euclid(MINUTES_PER_DAY);
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0).unwrap_or(NaiveTime::MIN)
}

/// Lenient `HH:MM` constructor used for config defaults.
pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Render as `HH:MM`, the format the timesheet UIs use.
pub fn fmt_hm(t: NaiveTime) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}
