//! Plain-text rendering of performance tables.

use crate::manual::ManualSheet;
use crate::models::{CustomDate, PerformanceWindow, Symbol, SymbolReport};

pub const UNAVAILABLE_MARKER: &str = "--";
pub const ERROR_MARKER: &str = "Error";

/// Format a change as a signed two-decimal percentage, or `--`.
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(value) => {
            // Avoid printing "-0.00%" for tiny negative values.
            let rounded = (value * 100.0).round() / 100.0;
            let value = if rounded == 0.0 { 0.0 } else { value };
            format!("{:+.2}%", value)
        }
        None => UNAVAILABLE_MARKER.to_string(),
    }
}

/// Column headers for the given windows and custom dates.
pub fn column_names(windows: &[PerformanceWindow], custom_dates: &[CustomDate]) -> Vec<String> {
    windows
        .iter()
        .map(|w| w.name().to_string())
        .chain(custom_dates.iter().map(|d| d.label()))
        .collect()
}

/// Render fetched reports as an aligned table.
///
/// A report whose fetch failed outright shows `Error` in every cell.
pub fn render_table(
    reports: &[SymbolReport],
    windows: &[PerformanceWindow],
    custom_dates: &[CustomDate],
) -> String {
    let columns = column_names(windows, custom_dates);
    let rows: Vec<Vec<String>> = reports
        .iter()
        .map(|report| {
            let mut row = vec![report.symbol.label.clone(), report.symbol.ticker.clone()];
            if report.is_error() {
                row.extend(columns.iter().map(|_| ERROR_MARKER.to_string()));
            } else {
                for window in windows {
                    row.push(format_change(report.performance.get(window.name()).flatten()));
                }
                for date in custom_dates {
                    row.push(format_change(report.custom_change(&date.label())));
                }
            }
            row
        })
        .collect();
    layout(&columns, &rows)
}

/// Render a manual sheet for the given symbols and columns.
pub fn render_manual(sheet: &ManualSheet, symbols: &[Symbol], columns: &[String]) -> String {
    let rows: Vec<Vec<String>> = symbols
        .iter()
        .map(|symbol| {
            let mut row = vec![symbol.label.clone(), symbol.ticker.clone()];
            row.extend(
                columns
                    .iter()
                    .map(|c| format_change(sheet.get(&symbol.ticker, c))),
            );
            row
        })
        .collect();
    layout(columns, &rows)
}

fn layout(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut header = vec!["Name".to_string(), "Ticker".to_string()];
    header.extend(columns.iter().cloned());

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            // Name and ticker are left-aligned, numbers right-aligned.
            if i < 2 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
