//! Clock value parsing and formatting.
//!
//! Clock-in and clock-out values are durations measured from midnight of the
//! punch date. A value past 24 hours (e.g. `1 days 08:00:00`) falls on the
//! following calendar day.

use chrono::Duration;
use rust_decimal::Decimal;

const MILLIS_PER_DAY: i64 = 86_400_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Text that source systems emit for an absent value.
const NULL_MARKERS: [&str; 5] = ["", "nan", "nat", "none", "null"];

/// Returns one calendar day as a duration.
pub fn one_day() -> Duration {
    Duration::milliseconds(MILLIS_PER_DAY)
}

/// Returns true if `text` denotes a missing value rather than a clock reading.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::models::is_null_marker;
///
/// assert!(is_null_marker(""));
/// assert!(is_null_marker(" NaN "));
/// assert!(!is_null_marker("08:00:00"));
/// ```
pub fn is_null_marker(text: &str) -> bool {
    let trimmed = text.trim();
    NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parses clock text into a duration since midnight.
///
/// Accepts `HH:MM`, `HH:MM:SS` and `HH:MM:SS.fff`, optionally prefixed with a
/// day count (`1 day`, `2 days`, `1 days,`). A bare day count (`1 days`) is
/// also accepted. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::models::parse_clock;
/// use chrono::Duration;
///
/// assert_eq!(parse_clock("08:30:00"), Some(Duration::minutes(510)));
/// assert_eq!(parse_clock("1 days 08:00:00"), Some(Duration::hours(32)));
/// assert_eq!(parse_clock("late"), None);
/// ```
pub fn parse_clock(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (days, rest) = match text.split_once("day") {
        Some((count, rest)) => {
            let days: i64 = count.trim().parse().ok()?;
            let rest = rest.strip_prefix('s').unwrap_or(rest);
            (days, rest.trim_start_matches(',').trim())
        }
        None => (0, text),
    };
    if days < 0 {
        return None;
    }
    let day_part = Duration::try_days(days)?;
    if rest.is_empty() {
        return Some(day_part);
    }

    let mut fields = rest.split(':');
    let hours = parse_unsigned(fields.next()?)?;
    let minutes = parse_unsigned(fields.next()?)?;
    let (seconds, millis) = match fields.next() {
        Some(field) => parse_seconds(field)?,
        None => (0, 0),
    };
    if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let time_part = Duration::try_hours(hours)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_seconds(seconds)?)?
        .checked_add(&Duration::try_milliseconds(millis)?)?;
    day_part.checked_add(&time_part)
}

fn parse_unsigned(field: &str) -> Option<i64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Splits `SS` or `SS.fff` into whole seconds and milliseconds.
fn parse_seconds(field: &str) -> Option<(i64, i64)> {
    match field.split_once('.') {
        Some((whole, fraction)) => {
            let seconds = parse_unsigned(whole)?;
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Sub-millisecond digits are truncated.
            let mut millis = 0;
            for (position, digit) in fraction.bytes().take(3).enumerate() {
                millis += i64::from(digit - b'0') * 10_i64.pow(2 - position as u32);
            }
            Some((seconds, millis))
        }
        None => Some((parse_unsigned(field)?, 0)),
    }
}

/// Formats a clock duration the way it is parsed: `HH:MM:SS` with an
/// optional `N days ` prefix and `.fff` suffix.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::models::format_clock;
/// use chrono::Duration;
///
/// assert_eq!(format_clock(Duration::hours(18)), "18:00:00");
/// assert_eq!(format_clock(Duration::hours(32)), "1 days 08:00:00");
/// ```
pub fn format_clock(value: Duration) -> String {
    let total = value.num_milliseconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();

    let days = total / MILLIS_PER_DAY;
    let rest = total % MILLIS_PER_DAY;
    let hours = rest / MILLIS_PER_HOUR;
    let minutes = (rest % MILLIS_PER_HOUR) / 60_000;
    let seconds = (rest % 60_000) / 1_000;
    let millis = rest % 1_000;

    let mut text = String::from(sign);
    if days > 0 {
        text.push_str(&format!("{} days ", days));
    }
    text.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if millis > 0 {
        text.push_str(&format!(".{:03}", millis));
    }
    text
}

/// Returns the time-of-day component of a clock duration, dropping whole days.
pub fn time_of_day(value: Duration) -> Duration {
    Duration::milliseconds(value.num_milliseconds().rem_euclid(MILLIS_PER_DAY))
}

/// Converts a duration into fractional hours.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::models::duration_hours;
/// use chrono::Duration;
/// use rust_decimal::Decimal;
///
/// assert_eq!(duration_hours(Duration::minutes(450)), Decimal::new(75, 1));
/// ```
pub fn duration_hours(value: Duration) -> Decimal {
    Decimal::from(value.num_milliseconds()) / Decimal::from(MILLIS_PER_HOUR)
}
