//! Chart fetching with ordered relay fallback.
//!
//! Every call walks the relay list from the top. The first relay that yields
//! a well-formed series wins; failures along the way are logged and skipped.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config;
use crate::error::{Result, TrackerError};
use crate::models::PriceSeries;
use crate::relay::RelayEndpoint;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// ChartRange
// ---------------------------------------------------------------------------

/// Time span requested from the chart endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRange {
    /// Coarse period token such as `"2y"`.
    Relative { range: String, interval: String },
    /// Explicit Unix-second bounds.
    Between { start: i64, end: i64, interval: String },
}

impl ChartRange {
    pub fn relative(range: &str) -> Self {
        Self::Relative {
            range: range.to_string(),
            interval: config::DEFAULT_INTERVAL.to_string(),
        }
    }

    pub fn between(start: i64, end: i64) -> Self {
        Self::Between {
            start,
            end,
            interval: config::DEFAULT_INTERVAL.to_string(),
        }
    }

    fn query(&self) -> String {
        match self {
            Self::Relative { range, interval } => {
                format!("range={}&interval={}", range, interval)
            }
            Self::Between {
                start,
                end,
                interval,
            } => format!("period1={}&period2={}&interval={}", start, end, interval),
        }
    }
}

/// Provider chart URL for a ticker and range.
pub fn chart_url(base: &str, ticker: &str, range: &ChartRange) -> String {
    format!("{}/{}?{}", base, ticker, range.query())
}

// ---------------------------------------------------------------------------
// Payload shape
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
}

#[derive(Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Interpret a provider payload as a price series.
///
/// Fails with `NotFound` when `chart.result[0]` is missing and with
/// `InvalidArgument` when the timestamp and close arrays are absent or differ
/// in length.
pub fn parse_chart(payload: Value) -> Result<PriceSeries> {
    let response: ChartResponse = serde_json::from_value(payload)?;
    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| TrackerError::NotFound("chart.result[0] is missing".to_string()))?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| TrackerError::InvalidArgument("no timestamp array".to_string()))?;
    let closes = data
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close)
        .ok_or_else(|| TrackerError::InvalidArgument("no close array".to_string()))?;

    PriceSeries::from_parallel(&timestamps, &closes).ok_or_else(|| {
        TrackerError::InvalidArgument(format!(
            "{} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

pub struct Fetcher {
    relays: Vec<Box<dyn RelayEndpoint>>,
    transport: Box<dyn Transport>,
    chart_base: String,
}

impl Fetcher {
    pub fn new(relays: Vec<Box<dyn RelayEndpoint>>, transport: Box<dyn Transport>) -> Self {
        Self {
            relays,
            transport,
            chart_base: config::CHART_BASE.to_string(),
        }
    }

    /// Override the provider base URL.
    pub fn with_chart_base(mut self, base: &str) -> Self {
        self.chart_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn relay_names(&self) -> Vec<&str> {
        self.relays.iter().map(|r| r.name()).collect()
    }

    /// Fetch a series for `ticker`, trying each relay in order.
    ///
    /// Returns `None` once every relay has failed.
    pub fn fetch(&self, ticker: &str, range: &ChartRange) -> Option<PriceSeries> {
        let target = chart_url(&self.chart_base, ticker, range);
        for relay in &self.relays {
            match self.try_relay(relay.as_ref(), &target) {
                Ok(series) => {
                    debug!(
                        ticker,
                        relay = relay.name(),
                        points = series.len(),
                        "fetched chart"
                    );
                    return Some(series);
                }
                Err(e) => {
                    warn!(ticker, relay = relay.name(), error = %e, "relay failed");
                }
            }
        }
        error!(ticker, relays = self.relays.len(), "all relays failed");
        None
    }

    fn try_relay(&self, relay: &dyn RelayEndpoint, target: &str) -> Result<PriceSeries> {
        let url = relay.request_url(target);
        debug!(relay = relay.name(), %url, "requesting");
        let body = self.transport.get(&url)?;
        let payload = relay.decode(&body)?;
        parse_chart(payload)
    }
}
