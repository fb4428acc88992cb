//! Manual-entry performance sheet.
//!
//! A symbol x column grid of user-typed percentages, persisted as-is. No
//! fetching is involved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualSheet {
    /// ticker -> column -> percentage
    #[serde(default)]
    cells: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ManualSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: &str, column: &str) -> Option<f64> {
        self.cells.get(ticker).and_then(|row| row.get(column)).copied()
    }

    /// Set a cell from raw user input. Empty input clears the cell.
    pub fn set(&mut self, ticker: &str, column: &str, input: &str) -> Result<()> {
        match parse_entry(input)? {
            Some(value) => {
                self.cells
                    .entry(ticker.to_string())
                    .or_default()
                    .insert(column.to_string(), value);
            }
            None => self.clear_cell(ticker, column),
        }
        Ok(())
    }

    pub fn clear_cell(&mut self, ticker: &str, column: &str) {
        if let Some(row) = self.cells.get_mut(ticker) {
            row.remove(column);
            if row.is_empty() {
                self.cells.remove(ticker);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parse a percentage typed by the user.
///
/// Accepts an optional sign, a comma or dot decimal separator and an optional
/// trailing `%`. Blank input parses to `None`.
pub fn parse_entry(input: &str) -> Result<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let normalized = number.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| TrackerError::InvalidArgument(format!("not a percentage: {}", input)))?;
    if !value.is_finite() {
        return Err(TrackerError::InvalidArgument(format!(
            "not a percentage: {}",
            input
        )));
    }
    Ok(Some(value))
}
