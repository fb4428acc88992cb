use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{MAX_CUSTOM_YEAR, MIN_CUSTOM_YEAR};
use crate::error::{Result, TrackerError};

// ---------------------------------------------------------------------------
// CustomDate: User-chosen start date for a custom column
// ---------------------------------------------------------------------------

/// A validated calendar date used as the start of a custom performance column.
///
/// Ordering is chronological (fields are compared year, month, day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDate")]
pub struct CustomDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Unchecked persisted form; routed through [`CustomDate::new`] on load.
#[derive(Deserialize)]
struct RawDate {
    year: i32,
    month: u32,
    day: u32,
}

impl TryFrom<RawDate> for CustomDate {
    type Error = TrackerError;

    fn try_from(raw: RawDate) -> Result<Self> {
        Self::new(raw.day, raw.month, raw.year)
    }
}

impl CustomDate {
    /// Validate and build a date.
    ///
    /// Day must be in 1..=31, month in 1..=12, year in 2000..=2100, and the
    /// combination must exist on the calendar.
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self> {
        if !(1..=31).contains(&day) {
            return Err(TrackerError::InvalidDate(format!(
                "day {} out of range 1-31",
                day
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(TrackerError::InvalidDate(format!(
                "month {} out of range 1-12",
                month
            )));
        }
        if !(MIN_CUSTOM_YEAR..=MAX_CUSTOM_YEAR).contains(&year) {
            return Err(TrackerError::InvalidDate(format!(
                "year {} out of range {}-{}",
                year, MIN_CUSTOM_YEAR, MAX_CUSTOM_YEAR
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(TrackerError::InvalidDate(format!(
                "{:02}/{:02}/{} is not a calendar date",
                day, month, year
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Column label, `DD/MM/YYYY`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Unix timestamp of midnight on this date in the given time zone.
    pub fn midnight_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<i64> {
        tz.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| {
                TrackerError::InvalidDate(format!("midnight of {} does not exist locally", self))
            })
    }

    /// Start timestamp for a fetch anchored at `now`.
    ///
    /// Rejects dates that are not strictly before `now`.
    pub fn start_before<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<i64> {
        let start = self.midnight_in(&now.timezone())?;
        if start >= now.timestamp() {
            return Err(TrackerError::InvalidDate(format!(
                "{} is not in the past",
                self
            )));
        }
        Ok(start)
    }
}

impl fmt::Display for CustomDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.day, self.month, self.year)
    }
}

impl FromStr for CustomDate {
    type Err = TrackerError;

    /// Parse `DD/MM/YYYY` (also accepts `-` or `.` as separators).
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(['/', '-', '.']).collect();
        if parts.len() != 3 {
            return Err(TrackerError::InvalidDate(format!(
                "expected DD/MM/YYYY, got: {}",
                s
            )));
        }
        let day: u32 = parts[0]
            .parse()
            .map_err(|_| TrackerError::InvalidDate(format!("invalid day: {}", parts[0])))?;
        let month: u32 = parts[1]
            .parse()
            .map_err(|_| TrackerError::InvalidDate(format!("invalid month: {}", parts[1])))?;
        let year: i32 = parts[2]
            .parse()
            .map_err(|_| TrackerError::InvalidDate(format!("invalid year: {}", parts[2])))?;
        Self::new(day, month, year)
    }
}
