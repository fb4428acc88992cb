use serde::{Deserialize, Serialize};

use super::performance::{PeriodChange, PerformanceResult};
use super::symbol::Symbol;

// ---------------------------------------------------------------------------
// FetchStatus: Whether the main series could be fetched
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    /// Every relay failed for the main series.
    Error,
}

// ---------------------------------------------------------------------------
// SymbolReport: Cached per-symbol row
// ---------------------------------------------------------------------------

/// One row of the performance table.
///
/// `performance` always holds one entry per configured window; on a failed
/// fetch every entry is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: Symbol,
    /// Unix timestamp of the fetch that produced this report.
    pub fetched_at: i64,
    pub status: FetchStatus,
    pub performance: PerformanceResult,
    /// One entry per custom date, labelled `DD/MM/YYYY`.
    #[serde(default)]
    pub custom: Vec<PeriodChange>,
}

impl SymbolReport {
    pub fn is_error(&self) -> bool {
        self.status == FetchStatus::Error
    }

    /// Change for a custom column, `None` if unavailable or not fetched.
    pub fn custom_change(&self, label: &str) -> Option<f64> {
        self.custom
            .iter()
            .find(|c| c.name == label)
            .and_then(|c| c.change)
    }
}
