//! Period-over-period percentage changes derived from a [`PriceSeries`].
//!
//! Each window picks a target timestamp, the series is scanned for the priced
//! sample nearest that target, and the match is accepted only if it lies
//! strictly within [`MATCH_TOLERANCE_SECS`] of it.

use chrono::{DateTime, TimeZone};

use crate::config::MATCH_TOLERANCE_SECS;
use crate::error::{Result, TrackerError};
use crate::models::{PeriodChange, PerformanceResult, PerformanceWindow, PricePoint, PriceSeries};

/// Find the priced sample nearest `target`.
///
/// Samples with an absent price are skipped. When two samples are equally
/// distant the earlier one wins. Returns `None` if the series has no priced
/// samples or the best distance is not strictly below the tolerance.
pub fn nearest_price(series: &PriceSeries, target: i64) -> Option<&PricePoint> {
    let mut best: Option<(&PricePoint, i64)> = None;
    for point in &series.points {
        if point.price.is_none() {
            continue;
        }
        let distance = (point.timestamp - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    match best {
        Some((point, distance)) if distance < MATCH_TOLERANCE_SECS => Some(point),
        _ => None,
    }
}

/// Percentage change from `base` to `latest`.
///
/// Returns `None` when `base` is zero or either input is not finite.
pub fn percent_change(base: f64, latest: f64) -> Option<f64> {
    if base == 0.0 || !base.is_finite() || !latest.is_finite() {
        return None;
    }
    Some((latest - base) / base * 100.0)
}

/// Compute one entry per window, anchored at `now`.
///
/// The latest price is the series' last priced sample. Any window whose
/// target cannot be matched is reported as unavailable.
pub fn compute<Tz: TimeZone>(
    series: &PriceSeries,
    windows: &[PerformanceWindow],
    now: &DateTime<Tz>,
) -> PerformanceResult {
    let latest = series.latest_price();
    let entries = windows
        .iter()
        .map(|window| {
            let change = latest.and_then(|latest| {
                let target = window.target_timestamp(now)?;
                let matched = nearest_price(series, target)?;
                percent_change(matched.price?, latest)
            });
            PeriodChange {
                name: window.name().to_string(),
                change,
            }
        })
        .collect();
    PerformanceResult { entries }
}

/// Change between the first and last priced samples of a series.
///
/// Used for custom-date columns, where the fetch boundaries are the window.
pub fn span_change(series: &PriceSeries) -> Result<f64> {
    let mut priced = series.priced();
    let first = priced.next();
    let last = priced.next_back();
    match (first, last) {
        (Some((_, first)), Some((_, last))) => percent_change(first, last).ok_or_else(|| {
            TrackerError::InsufficientData("first priced sample is zero".to_string())
        }),
        _ => Err(TrackerError::InsufficientData(format!(
            "need at least two priced samples, series has {}",
            series.priced().count()
        ))),
    }
}
