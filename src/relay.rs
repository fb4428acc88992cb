//! Relay endpoints the fetcher tries in order.
//!
//! A relay turns a target chart URL into the URL actually requested and
//! decodes the body it returns. Some relays hand back the provider's JSON
//! verbatim; others wrap it as `{ "contents": "<json string>" }`.

use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::config;
use crate::error::{Result, TrackerError};

pub trait RelayEndpoint: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// URL to request for the given target URL.
    fn request_url(&self, target: &str) -> String;

    /// Whether the body wraps the payload in a `contents` string.
    fn wraps_envelope(&self) -> bool {
        false
    }

    /// Decode a response body into the provider's JSON payload.
    fn decode(&self, body: &str) -> Result<Value> {
        if self.wraps_envelope() {
            unwrap_envelope(body)
        } else {
            Ok(serde_json::from_str(body)?)
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    contents: Option<String>,
}

/// Decode one `{ "contents": "<json string>" }` layer.
pub fn unwrap_envelope(body: &str) -> Result<Value> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let inner = envelope
        .contents
        .ok_or_else(|| TrackerError::NotFound("relay envelope has no contents".to_string()))?;
    Ok(serde_json::from_str(&inner)?)
}

// ---------------------------------------------------------------------------
// Direct
// ---------------------------------------------------------------------------

/// Requests the target URL as-is.
#[derive(Debug, Clone, Default)]
pub struct Direct;

impl RelayEndpoint for Direct {
    fn name(&self) -> &str {
        "direct"
    }

    fn request_url(&self, target: &str) -> String {
        target.to_string()
    }
}

// ---------------------------------------------------------------------------
// PrefixRelay
// ---------------------------------------------------------------------------

/// A relay that takes the percent-encoded target appended to a fixed prefix.
#[derive(Debug, Clone)]
pub struct PrefixRelay {
    name: String,
    prefix: String,
    wrapped: bool,
}

impl PrefixRelay {
    pub fn new(name: &str, prefix: &str, wrapped: bool) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            wrapped,
        }
    }
}

impl RelayEndpoint for PrefixRelay {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_url(&self, target: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}{}", self.prefix, encoded)
    }

    fn wraps_envelope(&self) -> bool {
        self.wrapped
    }
}

/// The default ordered relay list.
pub fn default_relays() -> Vec<Box<dyn RelayEndpoint>> {
    vec![
        Box::new(Direct),
        Box::new(PrefixRelay::new("corsproxy", config::CORSPROXY_PREFIX, false)),
        Box::new(PrefixRelay::new(
            "allorigins-raw",
            config::ALLORIGINS_RAW_PREFIX,
            false,
        )),
        Box::new(PrefixRelay::new(
            "allorigins-get",
            config::ALLORIGINS_GET_PREFIX,
            true,
        )),
        Box::new(PrefixRelay::new("codetabs", config::CODETABS_PREFIX, false)),
    ]
}
