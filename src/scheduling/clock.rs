//! Wall-clock helpers shared by the grid, the availability predicate and the
//! HTTP layer.
//!
//! Scheduling UIs submit times in both 12-hour ("10:00 AM") and 24-hour
//! ("10:00") form, so everything is normalized to minutes since midnight
//! before any comparison.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{macros::format_description, Date, Time};

time::serde::format_description!(pub clock_format, Time, "[hour]:[minute]");
time::serde::format_description!(pub date_format, Date, "[year]-[month]-[day]");

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Invalid slot grid: {0}")]
    InvalidGrid(String),
}

pub fn minutes_since_midnight(time: Time) -> u16 {
    u16::from(time.hour()) * 60 + u16::from(time.minute())
}

pub fn from_minutes(minutes: u16) -> Option<Time> {
    if minutes >= MINUTES_PER_DAY {
        return None;
    }
    Time::from_hms((minutes / 60) as u8, (minutes % 60) as u8, 0).ok()
}

/// Parses a time of day such as `14:30`, `14:30:00`, `2:30 PM` or `02:30pm`.
pub fn parse_clock(input: &str) -> Result<Time, ClockError> {
    let invalid = || ClockError::InvalidTime(input.to_string());
    let upper = input.trim().to_ascii_uppercase();

    let (body, pm) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let mut parts = body.split(':');
    let mut field = |required: bool| -> Result<u8, ClockError> {
        match parts.next() {
            Some(raw) => raw.trim().parse::<u8>().map_err(|_| invalid()),
            None if required => Err(invalid()),
            None => Ok(0),
        }
    };
    let hour = field(true)?;
    let minute = field(false)?;
    let second = field(false)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let hour = match pm {
        Some(_) if !(1..=12).contains(&hour) => return Err(invalid()),
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
        None => hour,
    };

    Time::from_hms(hour, minute, second).map_err(|_| invalid())
}

pub fn parse_date(input: &str) -> Result<Date, ClockError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ClockError::InvalidDate(input.to_string()))
}

/// 12-hour rendering used for stored range labels, e.g. `09:30 AM`.
pub fn format_clock(time: Time) -> String {
    let (suffix, hour) = match time.hour() {
        0 => ("AM", 12),
        h @ 1..=11 => ("AM", h),
        12 => ("PM", 12),
        h => ("PM", h - 12),
    };
    format!("{:02}:{:02} {}", hour, time.minute(), suffix)
}

/// A half-open `[start, end)` span of wall-clock time on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "clock_format")]
    pub start: Time,
    #[serde(with = "clock_format")]
    pub end: Time,
}

impl TimeRange {
    pub fn new(start: Time, end: Time) -> Result<Self, ClockError> {
        if minutes_since_midnight(start) >= minutes_since_midnight(end) {
            return Err(ClockError::InvalidRange(format!(
                "{} is not before {}",
                format_clock(start),
                format_clock(end)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: Time) -> bool {
        let minute = minutes_since_midnight(time);
        minutes_since_midnight(self.start) <= minute && minute < minutes_since_midnight(self.end)
    }

    pub fn starts_at(&self, time: Time) -> bool {
        minutes_since_midnight(self.start) == minutes_since_midnight(time)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_clock(self.start), format_clock(self.end))
    }
}

impl FromStr for TimeRange {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(" - ")
            .or_else(|| s.split_once('-'))
            .or_else(|| s.split_once('–'))
            .ok_or_else(|| ClockError::InvalidRange(s.to_string()))?;
        TimeRange::new(parse_clock(start)?, parse_clock(end)?)
    }
}
