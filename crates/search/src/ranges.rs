//! Implicit range math for decimal and date literals.
//!
//! FHIR search literals carry a precision: `10` means "somewhere between
//! 9.5 and 10.5", `1999-09` means "some instant in September 1999". This
//! module computes those tolerance intervals. They are used both when
//! parsing search values and when compiling prefixes into range fragments.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{InvalidSearchParameter, Result};

/// A closed numeric interval with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    pub start: f64,
    pub end: f64,
}

impl NumberRange {
    /// The zero-width interval `[number, number]`.
    ///
    /// Inequality prefixes ignore the precision tolerance and compare
    /// against the literal itself, which this degenerate range expresses.
    pub fn point(number: f64) -> Self {
        Self {
            start: number,
            end: number,
        }
    }

    /// Returns true if `value` lies within the interval (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// A closed instant interval with `start <= end`, in UTC.
///
/// A bare instant parses to a zero-width-to-precision interval: a
/// day-precision date covers `[00:00:00.000, 23:59:59.999]` of that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Counts the decimal places implied by a numeric literal.
///
/// Exponential notation is normalized first: `8e-1` has one decimal place,
/// `5.40e-3` has five. Integers have zero (possibly negative for literals
/// like `5e2`, which widens the tolerance accordingly).
pub fn decimal_places(literal: &str) -> i32 {
    let (mantissa, exponent) = match literal.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (literal, 0),
    };
    let mantissa_places = mantissa
        .split_once('.')
        .map(|(_, frac)| frac.len() as i32)
        .unwrap_or(0);
    mantissa_places - exponent
}

/// Computes the half-unit-in-last-place tolerance interval for a literal.
///
/// `tolerance = 0.5 × 10^(-decimalPlaces)`, so `10` maps to `[9.5, 10.5]`
/// and `10.0` to `[9.95, 10.05]`.
pub fn implicit_number_range(number: f64, literal: &str) -> NumberRange {
    let tolerance = 0.5 * 10f64.powi(-decimal_places(literal));
    NumberRange {
        start: number - tolerance,
        end: number + tolerance,
    }
}

static DATE_LITERAL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^(?P<year>\d{4})(?:-(?P<month>\d{2})(?:-(?P<day>\d{2})(?:T(?P<hours>\d{2}):(?P<minutes>\d{2})(?::(?P<seconds>\d{2})(?:\.(?P<ms>\d{3}))?)?(?P<tz>Z|[+-]\d{2}:\d{2})?)?)?)?$",
    )
    .expect("date literal regex is valid")
});

/// Parses an ISO-8601-like date literal into its precision interval.
///
/// Precision is inferred from which components are present (year, month,
/// day, minute, second, or millisecond); the interval is the literal's
/// floor and ceiling at that precision. Time zone offsets are honored and
/// the result is normalized to UTC; date-only literals are taken as UTC.
pub fn parse_date_range(literal: &str) -> Result<DateRange> {
    let invalid = || InvalidSearchParameter::new(format!("Invalid date format: {}", literal));

    let captures = DATE_LITERAL_REGEX.captures(literal).ok_or_else(invalid)?;
    let component = |name: &str| -> Option<u32> {
        captures
            .name(name)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };

    let year = component("year").ok_or_else(invalid)? as i32;
    let offset = match captures.name("tz").map(|m| m.as_str()) {
        None | Some("Z") => FixedOffset::east_opt(0).ok_or_else(invalid)?,
        Some(tz) => parse_tz_offset(tz).ok_or_else(invalid)?,
    };

    let (start_date, end_date) = match (component("month"), component("day")) {
        (None, _) => (
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
        ),
        (Some(month), None) => {
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            (first, last_day_of_month(year, month).ok_or_else(invalid)?)
        }
        (Some(month), Some(day)) => {
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
            (date, date)
        }
    };

    let (start_time, end_time) = match (component("hours"), component("minutes")) {
        (None, _) | (_, None) => (
            NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(invalid)?,
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).ok_or_else(invalid)?,
        ),
        (Some(hours), Some(minutes)) => match component("seconds") {
            None => (
                NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)?,
                NaiveTime::from_hms_milli_opt(hours, minutes, 59, 999).ok_or_else(invalid)?,
            ),
            Some(seconds) => match component("ms") {
                None => (
                    NaiveTime::from_hms_opt(hours, minutes, seconds).ok_or_else(invalid)?,
                    NaiveTime::from_hms_milli_opt(hours, minutes, seconds, 999)
                        .ok_or_else(invalid)?,
                ),
                Some(ms) => {
                    let exact = NaiveTime::from_hms_milli_opt(hours, minutes, seconds, ms)
                        .ok_or_else(invalid)?;
                    (exact, exact)
                }
            },
        },
    };

    Ok(DateRange {
        start: to_utc(NaiveDateTime::new(start_date, start_time), offset).ok_or_else(invalid)?,
        end: to_utc(NaiveDateTime::new(end_date, end_time), offset).ok_or_else(invalid)?,
    })
}

fn parse_tz_offset(tz: &str) -> Option<FixedOffset> {
    let sign = match tz.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let (hours, minutes) = tz[1..].split_once(':')?;
    let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
    FixedOffset::east_opt(sign * seconds)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    first_of_next.checked_sub_signed(Duration::days(1))
}

fn to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places("10"), 0);
        assert_eq!(decimal_places("10.57"), 2);
        assert_eq!(decimal_places("8e-1"), 1);
        assert_eq!(decimal_places("5.40e-3"), 5);
        assert_eq!(decimal_places("-8.2"), 1);
    }

    #[test]
    fn test_implicit_number_range() {
        let range = implicit_number_range(10.0, "10");
        assert_eq!(range.start, 9.5);
        assert_eq!(range.end, 10.5);

        // Trailing zeros narrow the interval: 10 vs 10.0
        let range = implicit_number_range(10.0, "10.0");
        assert_eq!(range.start, 9.95);
        assert_eq!(range.end, 10.05);

        // Interval width is 10^(-k) for k decimal places
        let range = implicit_number_range(10.57, "10.57");
        assert_eq!(range.start, 10.565);
        assert_eq!(range.end, 10.575000000000001);
    }

    #[test]
    fn test_point_range() {
        let range = NumberRange::point(10.0);
        assert_eq!(range.start, 10.0);
        assert_eq!(range.end, 10.0);
        assert!(range.contains(10.0));
        assert!(!range.contains(10.1));
    }

    #[test]
    fn test_day_precision() {
        let range = parse_date_range("1999-09-09").unwrap();
        assert_eq!(range.start, utc("1999-09-09T00:00:00Z"));
        assert_eq!(range.end, utc("1999-09-09T23:59:59.999Z"));
    }

    #[test]
    fn test_year_precision() {
        let range = parse_date_range("1999").unwrap();
        assert_eq!(range.start, utc("1999-01-01T00:00:00Z"));
        assert_eq!(range.end, utc("1999-12-31T23:59:59.999Z"));
    }

    #[test]
    fn test_month_precision() {
        let range = parse_date_range("2000-02").unwrap();
        assert_eq!(range.start, utc("2000-02-01T00:00:00Z"));
        assert_eq!(range.end, utc("2000-02-29T23:59:59.999Z"));

        let range = parse_date_range("1999-12").unwrap();
        assert_eq!(range.end, utc("1999-12-31T23:59:59.999Z"));
    }

    #[test]
    fn test_minute_precision() {
        let range = parse_date_range("1999-09-09T10:30Z").unwrap();
        assert_eq!(range.start, utc("1999-09-09T10:30:00Z"));
        assert_eq!(range.end, utc("1999-09-09T10:30:59.999Z"));
    }

    #[test]
    fn test_second_precision() {
        let range = parse_date_range("1999-09-09T10:30:15Z").unwrap();
        assert_eq!(range.start, utc("1999-09-09T10:30:15Z"));
        assert_eq!(range.end, utc("1999-09-09T10:30:15.999Z"));
    }

    #[test]
    fn test_millisecond_precision() {
        let range = parse_date_range("1999-09-09T10:30:15.123Z").unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.start, utc("1999-09-09T10:30:15.123Z"));
    }

    #[test]
    fn test_timezone_offset() {
        let range = parse_date_range("1999-09-09T10:30+02:00").unwrap();
        assert_eq!(range.start, utc("1999-09-09T08:30:00Z"));
        assert_eq!(range.end, utc("1999-09-09T08:30:59.999Z"));
    }

    #[test]
    fn test_invalid_dates() {
        for literal in ["not-a-date", "1999-13", "1999-02-30", "1999-09-09T25:00Z", "99"] {
            assert!(parse_date_range(literal).is_err(), "{}", literal);
        }
    }
}
