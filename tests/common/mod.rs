//! Shared test fixtures for the defense tracker integration tests.
//!
//! Provides a scripted in-memory [`Transport`] that answers by URL prefix and
//! records every request, plus helpers for building chart payloads.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use defense_tracker::models::PriceSeries;
use defense_tracker::{PrefixRelay, RelayEndpoint, Result, Transport, TrackerError};

pub const DAY: i64 = 86_400;

/// Canned response for a URL prefix.
#[derive(Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
}

/// A transport that answers from a fixed route table.
///
/// Routes are matched in order by URL prefix; unmatched URLs fail as if the
/// host were unreachable.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Vec<(String, Reply)>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, reply: Reply) -> Self {
        self.routes.push((prefix.to_string(), reply));
        self
    }

    /// Shared handle on the request log.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        for (prefix, reply) in &self.routes {
            if url.starts_with(prefix.as_str()) {
                return match reply {
                    Reply::Body(body) => Ok(body.clone()),
                    Reply::Status(status) => Err(TrackerError::Status {
                        status: *status,
                        url: url.to_string(),
                    }),
                };
            }
        }
        Err(TrackerError::NotFound(format!("unreachable: {}", url)))
    }
}

pub const RELAY_ONE: &str = "https://relay-one.test/?u=";
pub const RELAY_TWO: &str = "https://relay-two.test/get?url=";
pub const RELAY_THREE: &str = "https://relay-three.test/?q=";

/// Three relays: verbatim, wrapped, verbatim.
pub fn test_relays() -> Vec<Box<dyn RelayEndpoint>> {
    vec![
        Box::new(PrefixRelay::new("one", RELAY_ONE, false)),
        Box::new(PrefixRelay::new("two", RELAY_TWO, true)),
        Box::new(PrefixRelay::new("three", RELAY_THREE, false)),
    ]
}

/// Provider chart JSON for parallel timestamp/close arrays.
pub fn chart_json(timestamps: &[i64], closes: &[Option<f64>]) -> String {
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": { "currency": "EUR" },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
    .to_string()
}

/// Wrap a provider payload the way envelope relays do.
pub fn wrap(inner: &str) -> String {
    serde_json::json!({ "contents": inner, "status": { "http_code": 200 } }).to_string()
}

/// Daily series ending at `end`, one point per day, priced by `price(i)`.
pub fn daily_series(end: i64, days: usize, price: impl Fn(usize) -> Option<f64>) -> (Vec<i64>, Vec<Option<f64>>) {
    let start = end - (days as i64 - 1) * DAY;
    let timestamps: Vec<i64> = (0..days).map(|i| start + i as i64 * DAY).collect();
    let closes: Vec<Option<f64>> = (0..days).map(price).collect();
    (timestamps, closes)
}

pub fn series(points: &[(i64, Option<f64>)]) -> PriceSeries {
    let timestamps: Vec<i64> = points.iter().map(|p| p.0).collect();
    let closes: Vec<Option<f64>> = points.iter().map(|p| p.1).collect();
    PriceSeries::from_parallel(&timestamps, &closes).unwrap()
}
