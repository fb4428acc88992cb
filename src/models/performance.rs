use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::SECONDS_PER_DAY;

// ---------------------------------------------------------------------------
// PerformanceWindow: Named lookback used to pick a comparison point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceWindow {
    /// `days` calendar days before now.
    Lookback { name: String, days: i64 },
    /// Midnight of January 1 of the current year.
    YearToDate,
}

impl PerformanceWindow {
    pub fn lookback(name: &str, days: i64) -> Self {
        Self::Lookback {
            name: name.to_string(),
            days,
        }
    }

    /// The standard column set: 1D, 1W, 3M, 12M, YTD.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::lookback("1D", 1),
            Self::lookback("1W", 7),
            Self::lookback("3M", 90),
            Self::lookback("12M", 365),
            Self::YearToDate,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Lookback { name, .. } => name,
            Self::YearToDate => "YTD",
        }
    }

    /// Target timestamp for this window, anchored at `now`.
    ///
    /// The year-to-date boundary is resolved in `now`'s time zone. Returns
    /// `None` only if that midnight does not exist in the zone.
    pub fn target_timestamp<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<i64> {
        match self {
            Self::Lookback { days, .. } => Some(now.timestamp() - days * SECONDS_PER_DAY),
            Self::YearToDate => now
                .timezone()
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .earliest()
                .map(|midnight| midnight.timestamp()),
        }
    }
}

// ---------------------------------------------------------------------------
// PeriodChange: One column of a result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub name: String,
    /// Signed percentage, `None` when unavailable.
    pub change: Option<f64>,
}

// ---------------------------------------------------------------------------
// PerformanceResult: One entry per configured window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub entries: Vec<PeriodChange>,
}

impl PerformanceResult {
    /// A result with every window marked unavailable.
    pub fn unavailable(windows: &[PerformanceWindow]) -> Self {
        Self {
            entries: windows
                .iter()
                .map(|w| PeriodChange {
                    name: w.name().to_string(),
                    change: None,
                })
                .collect(),
        }
    }

    /// Look up a window's change. The outer `Option` is `None` if the window
    /// is not part of this result.
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.change)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
