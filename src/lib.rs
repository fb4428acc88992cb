//! Defense equity performance tracker.
//!
//! Fetches daily chart data for a fixed catalog of European defense stocks
//! from Yahoo Finance, falling back through an ordered list of relays when a
//! request fails, and derives 1D / 1W / 3M / 12M / YTD percentage changes plus
//! user-chosen custom-date columns. Results are cached in a caller-owned
//! [`Session`] and can be mirrored to a local JSON store for offline display.
//!
//! # Quick start
//!
//! ```no_run
//! use defense_tracker::DefenseTracker;
//!
//! let tracker = DefenseTracker::builder().build().unwrap();
//! let mut session = tracker.load_session().unwrap();
//!
//! tracker.refresh(&mut session).unwrap();
//! print!("{}", tracker.render(&session));
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod calculator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod manual;
pub mod models;
pub mod relay;
pub mod render;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(feature = "async")]
pub use async_client::AsyncDefenseTracker;
pub use error::{Result, TrackerError};
pub use fetcher::{ChartRange, Fetcher};
pub use manual::ManualSheet;
pub use relay::{Direct, PrefixRelay, RelayEndpoint};
pub use session::Session;
pub use store::Store;
pub use transport::{HttpTransport, Transport};

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use crate::models::{
    CustomDate, FetchStatus, PerformanceResult, PerformanceWindow, PeriodChange, Symbol,
    SymbolReport,
};

// ---------------------------------------------------------------------------
// DefenseTrackerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`DefenseTracker`] instance.
///
/// Use [`DefenseTracker::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](DefenseTrackerBuilder::build) to create the
/// tracker.
pub struct DefenseTrackerBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    request_delay: Duration,
    range: String,
    chart_base: String,
    symbols: Vec<Symbol>,
    windows: Vec<PerformanceWindow>,
    relays: Option<Vec<Box<dyn RelayEndpoint>>>,
    transport: Option<Box<dyn Transport>>,
}

impl Default for DefenseTrackerBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: config::DEFAULT_TIMEOUT,
            request_delay: config::DEFAULT_REQUEST_DELAY,
            range: config::DEFAULT_RANGE.to_string(),
            chart_base: config::CHART_BASE.to_string(),
            symbols: config::symbols(),
            windows: PerformanceWindow::defaults(),
            relays: None,
            transport: None,
        }
    }
}

impl DefenseTrackerBuilder {
    /// Set a custom store directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/defense-tracker` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, [`DefenseTracker::refresh`] never touches the network and
    /// only restores the persisted cache. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout. Defaults to 15 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause inserted between consecutive chart requests.
    ///
    /// Defaults to one second.
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set the `range` token used for the main series. Defaults to `"2y"`.
    pub fn range(mut self, range: &str) -> Self {
        self.range = range.to_string();
        self
    }

    /// Override the chart API base URL.
    pub fn chart_base(mut self, base: &str) -> Self {
        self.chart_base = base.to_string();
        self
    }

    /// Replace the tracked symbol catalog.
    pub fn symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Replace the performance windows.
    pub fn windows(mut self, windows: Vec<PerformanceWindow>) -> Self {
        self.windows = windows;
        self
    }

    /// Replace the ordered relay list.
    pub fn relays(mut self, relays: Vec<Box<dyn RelayEndpoint>>) -> Self {
        self.relays = Some(relays);
        self
    }

    /// Use a custom transport instead of the default HTTP client.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the tracker, opening the store and HTTP client.
    pub fn build(self) -> Result<DefenseTracker> {
        let store = Store::new(self.cache_dir)?;
        let transport = match self.transport {
            Some(t) => t,
            None => Box::new(HttpTransport::new(self.timeout)?),
        };
        let relays = self.relays.unwrap_or_else(relay::default_relays);
        let fetcher = Fetcher::new(relays, transport).with_chart_base(&self.chart_base);
        Ok(DefenseTracker {
            fetcher,
            store,
            offline: self.offline,
            request_delay: self.request_delay,
            range: self.range,
            symbols: self.symbols,
            windows: self.windows,
        })
    }
}

// ---------------------------------------------------------------------------
// DefenseTracker
// ---------------------------------------------------------------------------

/// The main entry point: owns the fetcher and the local store.
///
/// All mutable state lives in the caller's [`Session`].
pub struct DefenseTracker {
    fetcher: Fetcher,
    store: Store,
    offline: bool,
    request_delay: Duration,
    range: String,
    symbols: Vec<Symbol>,
    windows: Vec<PerformanceWindow>,
}

/// Sleeps between consecutive requests, never before the first one.
struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: false,
        }
    }

    fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.started = true;
    }
}

impl DefenseTracker {
    /// Create a new builder for configuring the tracker.
    pub fn builder() -> DefenseTrackerBuilder {
        DefenseTrackerBuilder::default()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn windows(&self) -> &[PerformanceWindow] {
        &self.windows
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    // -- Batch ---------------------------------------------------------------

    /// Refresh every tracked symbol into `session`, anchored at local now.
    ///
    /// In offline mode the persisted cache is loaded instead.
    pub fn refresh(&self, session: &mut Session) -> Result<()> {
        self.refresh_at(session, &Local::now())
    }

    /// Refresh every tracked symbol into `session`, anchored at `now`.
    ///
    /// Symbols are fetched one at a time with the configured delay between
    /// requests. A symbol whose fetch fails is recorded as an error row and
    /// the batch moves on. The cache is persisted once the batch completes.
    pub fn refresh_at<Tz: TimeZone>(&self, session: &mut Session, now: &DateTime<Tz>) -> Result<()> {
        if self.offline {
            let reports: Vec<SymbolReport> = self.store.load(config::PERFORMANCE_CACHE_KEY)?;
            info!(reports = reports.len(), "offline, restored cached reports");
            for report in reports {
                session.insert_report(report);
            }
            return Ok(());
        }

        session.set_loading(true);
        let custom_dates = session.custom_dates().to_vec();
        let mut pacer = Pacer::new(self.request_delay);
        for symbol in &self.symbols {
            let report = self.fetch_report(symbol, &custom_dates, now, &mut pacer);
            session.insert_report(report);
        }
        session.set_loading(false);

        let failed = session.reports().iter().filter(|r| r.is_error()).count();
        info!(symbols = self.symbols.len(), failed, "refresh complete");
        self.store
            .save(config::PERFORMANCE_CACHE_KEY, &session.reports())
    }

    /// Fetch one symbol's main series and custom-date columns.
    pub fn fetch_symbol<Tz: TimeZone>(
        &self,
        symbol: &Symbol,
        custom_dates: &[CustomDate],
        now: &DateTime<Tz>,
    ) -> SymbolReport {
        let mut pacer = Pacer::new(self.request_delay);
        self.fetch_report(symbol, custom_dates, now, &mut pacer)
    }

    fn fetch_report<Tz: TimeZone>(
        &self,
        symbol: &Symbol,
        custom_dates: &[CustomDate],
        now: &DateTime<Tz>,
        pacer: &mut Pacer,
    ) -> SymbolReport {
        pacer.wait();
        let range = ChartRange::relative(&self.range);
        let Some(series) = self.fetcher.fetch(&symbol.ticker, &range) else {
            return SymbolReport {
                symbol: symbol.clone(),
                fetched_at: now.timestamp(),
                status: FetchStatus::Error,
                performance: PerformanceResult::unavailable(&self.windows),
                custom: custom_dates
                    .iter()
                    .map(|date| PeriodChange {
                        name: date.label(),
                        change: None,
                    })
                    .collect(),
            };
        };

        let performance = calculator::compute(&series, &self.windows, now);
        let custom = custom_dates
            .iter()
            .map(|date| {
                let change = date.start_before(now).and_then(|start| {
                    pacer.wait();
                    self.fetch_span(&symbol.ticker, start, now)
                });
                let change = match change {
                    Ok(change) => Some(change),
                    Err(e) => {
                        warn!(ticker = %symbol.ticker, date = %date, error = %e, "custom column unavailable");
                        None
                    }
                };
                PeriodChange {
                    name: date.label(),
                    change,
                }
            })
            .collect();
        info!(ticker = %symbol.ticker, points = series.len(), "symbol refreshed");
        SymbolReport {
            symbol: symbol.clone(),
            fetched_at: now.timestamp(),
            status: FetchStatus::Ok,
            performance,
            custom,
        }
    }

    // -- Custom dates --------------------------------------------------------

    /// Percentage change for `ticker` from `date` to local now.
    pub fn custom_change(&self, ticker: &str, date: &CustomDate) -> Result<f64> {
        self.custom_change_at(ticker, date, &Local::now())
    }

    /// Percentage change for `ticker` between midnight of `date` and `now`.
    ///
    /// The date is checked before any request is made.
    pub fn custom_change_at<Tz: TimeZone>(
        &self,
        ticker: &str,
        date: &CustomDate,
        now: &DateTime<Tz>,
    ) -> Result<f64> {
        let start = date.start_before(now)?;
        self.ensure_online(&format!("{} since {}", ticker, date))?;
        self.fetch_span(ticker, start, now)
    }

    /// Changes since `date` for each of `symbols`, in order, anchored at local now.
    pub fn custom_changes<'a>(
        &self,
        symbols: &'a [Symbol],
        date: &CustomDate,
    ) -> Result<Vec<(&'a Symbol, Result<f64>)>> {
        self.custom_changes_at(symbols, date, &Local::now())
    }

    /// Changes since `date` for each of `symbols`, paced like a refresh.
    ///
    /// An invalid date or offline mode fails the whole call before any
    /// request; a symbol whose fetch fails carries its own error.
    pub fn custom_changes_at<'a, Tz: TimeZone>(
        &self,
        symbols: &'a [Symbol],
        date: &CustomDate,
        now: &DateTime<Tz>,
    ) -> Result<Vec<(&'a Symbol, Result<f64>)>> {
        let start = date.start_before(now)?;
        self.ensure_online(&format!("changes since {}", date))?;
        let mut pacer = Pacer::new(self.request_delay);
        Ok(symbols
            .iter()
            .map(|symbol| {
                pacer.wait();
                (symbol, self.fetch_span(&symbol.ticker, start, now))
            })
            .collect())
    }

    /// Add `date` to the session's custom columns, anchored at local now.
    ///
    /// Returns `false` if the date was already tracked.
    pub fn add_custom_date(&self, session: &mut Session, date: CustomDate) -> Result<bool> {
        self.add_custom_date_at(session, date, &Local::now())
    }

    /// Add `date` to the session's custom columns if it lies before `now`.
    pub fn add_custom_date_at<Tz: TimeZone>(
        &self,
        session: &mut Session,
        date: CustomDate,
        now: &DateTime<Tz>,
    ) -> Result<bool> {
        date.start_before(now)?;
        Ok(session.add_custom_date(date))
    }

    fn ensure_online(&self, what: &str) -> Result<()> {
        if self.offline {
            return Err(TrackerError::Offline(format!("cannot fetch {}", what)));
        }
        Ok(())
    }

    fn fetch_span<Tz: TimeZone>(&self, ticker: &str, start: i64, now: &DateTime<Tz>) -> Result<f64> {
        let range = ChartRange::between(start, now.timestamp());
        let series = self
            .fetcher
            .fetch(ticker, &range)
            .ok_or_else(|| TrackerError::NotFound(format!("no chart data for {}", ticker)))?;
        calculator::span_change(&series)
    }

    // -- Persistence ---------------------------------------------------------

    /// Restore the cached reports and custom dates from the store.
    pub fn load_session(&self) -> Result<Session> {
        let reports: Vec<SymbolReport> = self.store.load(config::PERFORMANCE_CACHE_KEY)?;
        let dates: Vec<CustomDate> = self.store.load(config::CUSTOM_DATES_KEY)?;
        Ok(Session::from_parts(reports, dates))
    }

    /// Persist the session's reports and custom dates.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.store
            .save(config::PERFORMANCE_CACHE_KEY, &session.reports())?;
        self.store
            .save(config::CUSTOM_DATES_KEY, &session.custom_dates())
    }

    pub fn manual_sheet(&self) -> Result<ManualSheet> {
        self.store.load(config::MANUAL_ENTRIES_KEY)
    }

    /// Set one manual cell, rejecting tickers outside the catalog and
    /// columns the session does not render.
    pub fn set_manual_cell(
        &self,
        session: &Session,
        sheet: &mut ManualSheet,
        ticker: &str,
        column: &str,
        input: &str,
    ) -> Result<()> {
        if !self.symbols.iter().any(|s| s.ticker == ticker) {
            return Err(TrackerError::NotFound(format!("unknown ticker: {}", ticker)));
        }
        if !self.columns(session).iter().any(|c| c == column) {
            return Err(TrackerError::InvalidArgument(format!(
                "unknown column: {}",
                column
            )));
        }
        sheet.set(ticker, column, input)
    }

    pub fn save_manual_sheet(&self, sheet: &ManualSheet) -> Result<()> {
        self.store.save(config::MANUAL_ENTRIES_KEY, sheet)
    }

    /// Remove every persisted file.
    pub fn clear_cache(&self) -> Result<()> {
        self.store.clear()
    }

    // -- Rendering -----------------------------------------------------------

    /// Render the session's reports as a text table.
    pub fn render(&self, session: &Session) -> String {
        render::render_table(session.reports(), &self.windows, session.custom_dates())
    }

    /// Column headers for the session: windows followed by custom dates.
    pub fn columns(&self, session: &Session) -> Vec<String> {
        render::column_names(&self.windows, session.custom_dates())
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for DefenseTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DefenseTracker(store={}, relays=[{}], symbols={}, offline={})",
            self.store.dir.display(),
            self.fetcher.relay_names().join(", "),
            self.symbols.len(),
            self.offline
        )
    }
}
