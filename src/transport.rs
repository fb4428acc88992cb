//! HTTP seam used by the fetcher.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config;
use crate::error::{Result, TrackerError};

/// Issues a GET request and returns the response body.
///
/// Non-success statuses must be reported as [`TrackerError::Status`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<String>;
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config::USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TrackerError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }
}
