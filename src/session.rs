//! Caller-owned state for one tracking session.

use crate::models::{CustomDate, SymbolReport};

/// Report cache and custom-date list for one caller.
///
/// Reports are kept in insertion order and keyed by ticker; inserting a
/// report for a ticker that is already present replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct Session {
    reports: Vec<SymbolReport>,
    custom_dates: Vec<CustomDate>,
    loading: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from persisted parts.
    pub fn from_parts(reports: Vec<SymbolReport>, mut custom_dates: Vec<CustomDate>) -> Self {
        custom_dates.sort();
        custom_dates.dedup();
        Self {
            reports,
            custom_dates,
            loading: false,
        }
    }

    pub fn reports(&self) -> &[SymbolReport] {
        &self.reports
    }

    pub fn report(&self, ticker: &str) -> Option<&SymbolReport> {
        self.reports.iter().find(|r| r.symbol.ticker == ticker)
    }

    pub fn insert_report(&mut self, report: SymbolReport) {
        match self
            .reports
            .iter_mut()
            .find(|r| r.symbol.ticker == report.symbol.ticker)
        {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    pub fn clear_reports(&mut self) {
        self.reports.clear();
    }

    /// Custom dates in chronological order.
    pub fn custom_dates(&self) -> &[CustomDate] {
        &self.custom_dates
    }

    /// Add a custom date. Returns `false` if it was already present.
    pub fn add_custom_date(&mut self, date: CustomDate) -> bool {
        match self.custom_dates.binary_search(&date) {
            Ok(_) => false,
            Err(pos) => {
                self.custom_dates.insert(pos, date);
                true
            }
        }
    }

    /// Remove a custom date. Returns `false` if it was not present.
    pub fn remove_custom_date(&mut self, date: &CustomDate) -> bool {
        match self.custom_dates.binary_search(date) {
            Ok(pos) => {
                self.custom_dates.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether a refresh is in progress.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}
