//! CF-convention time encoding.
//!
//! A CF time axis stores each timestamp as a number of `unit`s elapsed since
//! a reference date, counted in a named calendar. This module parses the
//! `units` / `calendar` attribute pair and converts between timestamps and
//! those offsets.
//!
//! Supported calendars:
//!
//! | attribute value | behavior |
//! |---|---|
//! | `standard`, `gregorian` | Julian before 1582-10-05, Gregorian from 1582-10-15 |
//! | `proleptic_gregorian` | Gregorian rules extended backwards |
//! | `julian` | every fourth year is a leap year |
//! | `noleap`, `365_day` | no leap years |
//! | `all_leap`, `366_day` | every year is a leap year |
//! | `360_day` | twelve months of thirty days |

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Cumulative days before each month in a 365 day year.
const CUMULATIVE_DAYS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Cumulative days before each month in a 366 day year.
const CUMULATIVE_DAYS_LEAP: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Errors raised while decoding or encoding CF times.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Invalid time units '{0}': expected '<unit> since <reference date>'")]
    InvalidUnits(String),

    #[error("Unknown time unit '{0}'")]
    UnknownUnit(String),

    #[error("Unknown calendar '{0}'")]
    UnknownCalendar(String),

    #[error("Invalid date/time '{0}'")]
    InvalidDateTime(String),

    /// The date exists in the Gregorian calendar but not in the target one.
    #[error("{date} does not exist in the {calendar} calendar")]
    DateNotInCalendar { date: String, calendar: Calendar },

    #[error("Decoding offsets is not supported for the {0} calendar")]
    UnsupportedCalendar(Calendar),

    #[error("Offset {0} cannot be represented as a date")]
    OffsetOutOfRange(f64),
}

/// Result type for CF time operations.
pub type TimeResult<T> = Result<T, TimeError>;

/// The unit part of a CF `units` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => SECONDS_PER_DAY,
        }
    }

    /// Canonical plural name as written in `units` attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "microseconds" | "microsecond" | "us" => Ok(TimeUnit::Microseconds),
            "milliseconds" | "millisecond" | "msec" | "ms" => Ok(TimeUnit::Milliseconds),
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            _ => Err(TimeError::UnknownUnit(s.to_string())),
        }
    }
}

/// A parsed CF `units` attribute such as `days since 1970-01-01 00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    pub fn new(unit: TimeUnit, reference: NaiveDateTime) -> Self {
        Self { unit, reference }
    }
}

impl FromStr for TimeUnits {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (unit, reference) = trimmed
            .split_once(" since ")
            .ok_or_else(|| TimeError::InvalidUnits(s.to_string()))?;
        let unit: TimeUnit = unit.trim().parse()?;
        let reference = parse_datetime(reference)
            .map_err(|_| TimeError::InvalidUnits(s.to_string()))?;
        Ok(Self { unit, reference })
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} since {}",
            self.unit.as_str(),
            self.reference.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// A CF calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    /// Mixed Julian/Gregorian (`standard` or `gregorian`).
    #[serde(alias = "gregorian")]
    Standard,
    ProlepticGregorian,
    Julian,
    /// `noleap` or `365_day`.
    #[serde(rename = "noleap", alias = "365_day")]
    NoLeap,
    /// `all_leap` or `366_day`.
    #[serde(alias = "366_day")]
    AllLeap,
    #[serde(rename = "360_day")]
    Day360,
}

impl Calendar {
    /// Canonical attribute value for this calendar.
    pub fn as_str(&self) -> &'static str {
        match self {
            Calendar::Standard => "standard",
            Calendar::ProlepticGregorian => "proleptic_gregorian",
            Calendar::Julian => "julian",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
        }
    }

    /// Whether offsets in this calendar can be decoded back to real-world
    /// timestamps.
    pub fn is_real_world(&self) -> bool {
        matches!(self, Calendar::Standard | Calendar::ProlepticGregorian)
    }

    /// Day count of `date` in this calendar, relative to an arbitrary but
    /// fixed epoch. Only differences between day counts are meaningful.
    fn day_number(&self, date: NaiveDate) -> TimeResult<i64> {
        let (y, m, d) = (date.year() as i64, date.month() as i64, date.day() as i64);
        let missing = || TimeError::DateNotInCalendar {
            date: date.to_string(),
            calendar: *self,
        };

        match self {
            Calendar::ProlepticGregorian => Ok(gregorian_jdn(y, m, d)),
            Calendar::Julian => Ok(julian_jdn(y, m, d)),
            Calendar::Standard => {
                if (y, m, d) >= (1582, 10, 15) {
                    Ok(gregorian_jdn(y, m, d))
                } else if (y, m, d) <= (1582, 10, 4) {
                    Ok(julian_jdn(y, m, d))
                } else {
                    Err(missing())
                }
            }
            Calendar::NoLeap => {
                if m == 2 && d == 29 {
                    return Err(missing());
                }
                Ok(365 * y + CUMULATIVE_DAYS[(m - 1) as usize] + d - 1)
            }
            Calendar::AllLeap => Ok(366 * y + CUMULATIVE_DAYS_LEAP[(m - 1) as usize] + d - 1),
            Calendar::Day360 => {
                if d > 30 {
                    return Err(missing());
                }
                Ok(360 * y + 30 * (m - 1) + d - 1)
            }
        }
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::Standard
    }
}

impl FromStr for Calendar {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Calendar::Standard),
            "proleptic_gregorian" => Ok(Calendar::ProlepticGregorian),
            "julian" => Ok(Calendar::Julian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            _ => Err(TimeError::UnknownCalendar(s.to_string())),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Julian day number of a proleptic Gregorian date.
fn gregorian_jdn(y: i64, m: i64, d: i64) -> i64 {
    let a = (14 - m).div_euclid(12);
    let y = y + 4800 - a;
    let m = m + 12 * a - 3;
    d + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4) - y.div_euclid(100)
        + y.div_euclid(400)
        - 32045
}

/// Julian day number of a Julian calendar date.
fn julian_jdn(y: i64, m: i64, d: i64) -> i64 {
    let a = (14 - m).div_euclid(12);
    let y = y + 4800 - a;
    let m = m + 12 * a - 3;
    d + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4) - 32083
}

fn seconds_of_day(t: &NaiveDateTime) -> f64 {
    t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 * 1e-9
}

/// Encode `timestamp` as an offset in `units`, counted in `calendar`.
///
/// The timestamp's year/month/day fields are interpreted in the target
/// calendar, so dates the calendar lacks (Feb 29 in `noleap`, day 31 in
/// `360_day`, the 1582 reform gap in `standard`) are rejected.
pub fn date2num(
    timestamp: NaiveDateTime,
    units: &TimeUnits,
    calendar: Calendar,
) -> TimeResult<f64> {
    let days = calendar.day_number(timestamp.date())?
        - calendar.day_number(units.reference.date())?;
    let seconds = days as f64 * SECONDS_PER_DAY + seconds_of_day(&timestamp)
        - seconds_of_day(&units.reference);
    Ok(seconds / units.unit.seconds())
}

/// Decode an offset back into a timestamp.
///
/// Only the real-world calendars are supported; in `standard`, both the
/// reference and the result must fall on or after the 1582-10-15 reform.
pub fn num2date(offset: f64, units: &TimeUnits, calendar: Calendar) -> TimeResult<NaiveDateTime> {
    if !calendar.is_real_world() {
        return Err(TimeError::UnsupportedCalendar(calendar));
    }
    if !offset.is_finite() {
        return Err(TimeError::OffsetOutOfRange(offset));
    }

    let micros = (offset * units.unit.seconds() * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return Err(TimeError::OffsetOutOfRange(offset));
    }
    let result = units
        .reference
        .checked_add_signed(Duration::microseconds(micros as i64))
        .ok_or(TimeError::OffsetOutOfRange(offset))?;

    if calendar == Calendar::Standard {
        let reform = reform_date();
        if units.reference.date() < reform || result.date() < reform {
            return Err(TimeError::UnsupportedCalendar(calendar));
        }
    }
    Ok(result)
}

fn reform_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1582, 10, 15).unwrap_or(NaiveDate::MIN)
}

/// Parse a timestamp in one of the forms found in CF reference dates and on
/// command lines: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.f]]`,
/// `YYYY-MM-DDTHH:MM[:SS[.f]]`, optionally followed by `Z`, `UTC` or a UTC
/// offset. Offsets are folded into the returned UTC timestamp.
pub fn parse_datetime(s: &str) -> TimeResult<NaiveDateTime> {
    let trimmed = s.trim();
    let stripped = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(&stripped.replacen(' ', "T", 1)) {
        return Ok(dt.naive_utc());
    }

    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stripped, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(stripped, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TimeError::InvalidDateTime(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn test_parse_units() {
        let units: TimeUnits = "days since 1970-01-01 00:00:00".parse().unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        assert_eq!(units.reference, ts("1970-01-01"));
        assert_eq!(units.to_string(), "days since 1970-01-01 00:00:00");
    }

    #[test]
    fn test_parse_units_variants() {
        let units: TimeUnits = "hours since 2000-01-01T12:00:00Z".parse().unwrap();
        assert_eq!(units.unit, TimeUnit::Hours);
        assert_eq!(units.reference, ts("2000-01-01 12:00:00"));

        let units: TimeUnits = "seconds since 1970-01-01".parse().unwrap();
        assert_eq!(units.unit, TimeUnit::Seconds);
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(matches!(
            "days after 1970-01-01".parse::<TimeUnits>(),
            Err(TimeError::InvalidUnits(_))
        ));
        assert!(matches!(
            "fortnights since 1970-01-01".parse::<TimeUnits>(),
            Err(TimeError::UnknownUnit(_))
        ));
        assert!(matches!(
            "days since yesterday".parse::<TimeUnits>(),
            Err(TimeError::InvalidUnits(_))
        ));
    }

    #[test]
    fn test_parse_datetime_offset_is_folded() {
        assert_eq!(ts("2000-01-01T05:00:00+05:00"), ts("2000-01-01 00:00:00"));
    }

    #[test]
    fn test_jdn_reference_values() {
        // 2000-01-01 is JDN 2451545 in the Gregorian calendar
        assert_eq!(gregorian_jdn(2000, 1, 1), 2_451_545);
        // The reform: Julian 1582-10-04 is followed by Gregorian 1582-10-15
        assert_eq!(gregorian_jdn(1582, 10, 15) - julian_jdn(1582, 10, 4), 1);
    }

    #[test]
    fn test_calendar_names() {
        assert_eq!("gregorian".parse::<Calendar>().unwrap(), Calendar::Standard);
        assert_eq!("365_day".parse::<Calendar>().unwrap(), Calendar::NoLeap);
        assert_eq!("360_day".parse::<Calendar>().unwrap(), Calendar::Day360);
        assert!("martian".parse::<Calendar>().is_err());
    }
}
