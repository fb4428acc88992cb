//! Async wrapper around [`DefenseTracker`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all tracker operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free. A
//! refresh sleeps between requests, so it must never run on a runtime worker.
//!
//! # Example
//!
//! ```no_run
//! use defense_tracker::AsyncDefenseTracker;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let tracker = AsyncDefenseTracker::builder().build().await.unwrap();
//!     let session = tracker.load_session().await.unwrap();
//!     let session = tracker.refresh(session).await.unwrap();
//!     println!("{} rows", session.reports().len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config;
use crate::error::{Result, TrackerError};
use crate::session::Session;
use crate::DefenseTracker;

// ---------------------------------------------------------------------------
// AsyncDefenseTrackerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncDefenseTracker`] instance.
pub struct AsyncDefenseTrackerBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    request_delay: Duration,
}

impl Default for AsyncDefenseTrackerBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: config::DEFAULT_TIMEOUT,
            request_delay: config::DEFAULT_REQUEST_DELAY,
        }
    }
}

impl AsyncDefenseTrackerBuilder {
    /// Set a custom store directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause inserted between consecutive chart requests.
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Build the async tracker.
    ///
    /// The blocking HTTP client is created on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncDefenseTracker> {
        tokio::task::spawn_blocking(move || {
            let mut builder = DefenseTracker::builder();
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            builder = builder
                .offline(self.offline)
                .timeout(self.timeout)
                .request_delay(self.request_delay);
            Ok(AsyncDefenseTracker::from_tracker(builder.build()?))
        })
        .await
        .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncDefenseTracker
// ---------------------------------------------------------------------------

/// Async wrapper around [`DefenseTracker`].
///
/// Operations are dispatched to a blocking thread pool and serialised through
/// a [`Mutex`], so two refreshes never interleave their requests.
pub struct AsyncDefenseTracker {
    inner: Arc<Mutex<DefenseTracker>>,
}

impl AsyncDefenseTracker {
    /// Create a new builder for configuring the async tracker.
    pub fn builder() -> AsyncDefenseTrackerBuilder {
        AsyncDefenseTrackerBuilder::default()
    }

    /// Wrap an already-built tracker.
    pub fn from_tracker(tracker: DefenseTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Run a sync tracker operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DefenseTracker) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tracker = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = tracker
                .lock()
                .map_err(|_| TrackerError::InvalidArgument("tracker lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Restore the persisted session.
    pub async fn load_session(&self) -> Result<Session> {
        self.run(|t| t.load_session()).await
    }

    /// Persist a session.
    pub async fn save_session(&self, session: Session) -> Result<Session> {
        self.run(move |t| {
            t.save_session(&session)?;
            Ok(session)
        })
        .await
    }

    /// Refresh every tracked symbol, handing the updated session back.
    pub async fn refresh(&self, session: Session) -> Result<Session> {
        self.run(move |t| {
            let mut session = session;
            t.refresh(&mut session)?;
            Ok(session)
        })
        .await
    }

    /// Render a session as a text table.
    pub async fn render(&self, session: Session) -> Result<String> {
        self.run(move |t| Ok(t.render(&session))).await
    }
}
