//! Batch driver tests: one row per symbol, failure isolation, custom columns
//! and offline restore.

mod common;

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use common::{chart_json, test_relays, wrap, Reply, ScriptedTransport, DAY, RELAY_ONE, RELAY_TWO};
use defense_tracker::models::{CustomDate, PerformanceWindow, Symbol};
use defense_tracker::render::ERROR_MARKER;
use defense_tracker::{DefenseTracker, Session, TrackerError};

const CHART: &str = "https://chart.test/chart";

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 16, 17, 30, 0).unwrap()
}

/// Rising daily series ending at `now`, 500 days long.
fn healthy_chart() -> String {
    let (ts, closes) = common::daily_series(now().timestamp(), 500, |i| Some(100.0 + i as f64));
    chart_json(&ts, &closes)
}

fn encoded(ticker: &str) -> String {
    url::form_urlencoded::byte_serialize(format!("{}/{}?", CHART, ticker).as_bytes()).collect()
}

fn three_symbols() -> Vec<Symbol> {
    vec![
        Symbol::new("RHM.DE", "Rheinmetall"),
        Symbol::new("BA.L", "BAE Systems"),
        Symbol::new("HO.PA", "Thales"),
    ]
}

fn paced_tracker(
    transport: ScriptedTransport,
    dir: &std::path::Path,
    delay: Duration,
    symbols: Vec<Symbol>,
) -> DefenseTracker {
    DefenseTracker::builder()
        .cache_dir(dir)
        .chart_base(CHART)
        .relays(test_relays())
        .transport(Box::new(transport))
        .request_delay(delay)
        .symbols(symbols)
        .build()
        .unwrap()
}

fn tracker(transport: ScriptedTransport, dir: &std::path::Path) -> DefenseTracker {
    paced_tracker(transport, dir, Duration::ZERO, three_symbols())
}

/// Custom-range payload: 50, absent, 60 after `start`.
fn span_chart(start: i64) -> String {
    chart_json(
        &[start + DAY, start + 2 * DAY, start + 3 * DAY],
        &[Some(50.0), None, Some(60.0)],
    )
}

#[test]
fn one_failed_symbol_does_not_stop_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let bae = format!("{}{}", RELAY_ONE, encoded("BA.L"));
    let transport = ScriptedTransport::new()
        .route(&bae, Reply::Status(500))
        .route(RELAY_ONE, Reply::Body(healthy_chart()));
    let t = tracker(transport, tmp.path());

    let mut session = Session::new();
    t.refresh_at(&mut session, &now()).unwrap();

    assert_eq!(session.reports().len(), 3);
    assert!(!session.report("RHM.DE").unwrap().is_error());
    let bae = session.report("BA.L").unwrap();
    assert!(bae.is_error());
    assert_eq!(bae.performance.len(), PerformanceWindow::defaults().len());
    assert!(bae.performance.entries.iter().all(|e| e.change.is_none()));
    assert!(!session.report("HO.PA").unwrap().is_error());
    assert!(!session.is_loading());

    let table = t.render(&session);
    assert!(table.contains(ERROR_MARKER));
}

#[test]
fn every_report_has_one_entry_per_window() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let t = tracker(transport, tmp.path());

    let mut session = Session::new();
    t.refresh_at(&mut session, &now()).unwrap();

    let windows = PerformanceWindow::defaults();
    for report in session.reports() {
        let performance = &report.performance;
        assert_eq!(performance.len(), windows.len());
        for window in &windows {
            assert!(performance.get(window.name()).unwrap().is_some());
        }
    }
}

#[test]
fn custom_columns_are_fetched_per_symbol() {
    let tmp = tempfile::tempdir().unwrap();
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap().timestamp();
    let custom_body = span_chart(start);
    let transport = ScriptedTransport::new()
        .route(
            &format!("{}{}", RELAY_ONE, encoded("RHM.DE").replace("%3F", "%3Fperiod1")),
            Reply::Status(502),
        )
        .route(RELAY_ONE, Reply::Body(healthy_chart()))
        .route(RELAY_TWO, Reply::Body(wrap(&custom_body)));
    let calls = transport.calls();
    let t = tracker(transport, tmp.path());

    let mut session = Session::new();
    session.add_custom_date(CustomDate::new(1, 6, 2025).unwrap());
    t.refresh_at(&mut session, &now()).unwrap();

    let rhm = session.report("RHM.DE").unwrap();
    let change = rhm.custom_change("01/06/2025").unwrap();
    assert!((change - 20.0).abs() < 1e-9);

    // Three main fetches, three custom fetches, plus one fallback for RHM.DE.
    assert_eq!(calls.lock().unwrap().len(), 7);
}

#[test]
fn failed_main_fetch_skips_custom_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let calls = transport.calls();
    let t = tracker(transport, tmp.path());

    let mut session = Session::new();
    session.add_custom_date(CustomDate::new(1, 6, 2025).unwrap());
    t.refresh_at(&mut session, &now()).unwrap();

    assert!(session.reports().iter().all(|r| r.is_error()));
    // Three relays tried per symbol, nothing else.
    assert_eq!(calls.lock().unwrap().len(), 9);
}

#[test]
fn custom_change_validates_before_any_request() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let calls = transport.calls();
    let t = tracker(transport, tmp.path());

    let future = CustomDate::new(1, 1, 2026).unwrap();
    let result = t.custom_change_at("RHM.DE", &future, &now());
    assert!(matches!(result, Err(TrackerError::InvalidDate(_))));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn custom_change_needs_two_points() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new()
        .route(RELAY_ONE, Reply::Body(chart_json(&[1, 2], &[Some(5.0), None])));
    let t = tracker(transport, tmp.path());

    let date = CustomDate::new(1, 6, 2025).unwrap();
    assert!(matches!(
        t.custom_change_at("RHM.DE", &date, &now()),
        Err(TrackerError::InsufficientData(_))
    ));
}

#[test]
fn refresh_persists_and_offline_restores() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let t = tracker(transport, tmp.path());

    let mut session = Session::new();
    session.add_custom_date(CustomDate::new(2, 1, 2025).unwrap());
    t.refresh_at(&mut session, &now()).unwrap();
    t.save_session(&session).unwrap();

    let offline_transport = ScriptedTransport::new();
    let calls = offline_transport.calls();
    let offline = DefenseTracker::builder()
        .cache_dir(tmp.path())
        .transport(Box::new(offline_transport))
        .offline(true)
        .build()
        .unwrap();

    let mut restored = offline.load_session().unwrap();
    let tickers = |s: &Session| -> Vec<String> {
        s.reports().iter().map(|r| r.symbol.ticker.clone()).collect()
    };
    assert_eq!(tickers(&restored), tickers(&session));
    assert_eq!(restored.custom_dates(), session.custom_dates());
    let before = &session.report("RHM.DE").unwrap().performance;
    let after = &restored.report("RHM.DE").unwrap().performance;
    for (a, b) in before.entries.iter().zip(&after.entries) {
        assert_eq!(a.name, b.name);
        assert!((a.change.unwrap() - b.change.unwrap()).abs() < 1e-9);
    }

    offline.refresh(&mut restored).unwrap();
    assert_eq!(restored.reports().len(), 3);
    assert!(calls.lock().unwrap().is_empty());

    assert!(matches!(
        offline.custom_change("RHM.DE", &CustomDate::new(2, 1, 2025).unwrap()),
        Err(TrackerError::Offline(_))
    ));
}

#[test]
fn display_lists_relays() {
    let tmp = tempfile::tempdir().unwrap();
    let t = tracker(ScriptedTransport::new(), tmp.path());
    let shown = t.to_string();
    assert!(shown.contains("relays=[one, two, three]"));
    assert!(shown.contains("symbols=3"));
}

#[test]
fn fetch_symbol_reports_without_touching_session() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let t = tracker(transport, tmp.path());

    let symbol = Symbol::new("SAF.PA", "Safran");
    let report = t.fetch_symbol(&symbol, &[], &now());
    assert!(!report.is_error());
    assert_eq!(report.fetched_at, now().timestamp());
    assert!(report.custom.is_empty());
    assert!(!t.store().contains(defense_tracker::config::PERFORMANCE_CACHE_KEY));
}

// ---------------------------------------------------------------------------
// Request pacing
// ---------------------------------------------------------------------------

#[test]
fn batch_sleeps_between_requests_only() {
    let delay = Duration::from_millis(50);
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let calls = transport.calls();
    let t = paced_tracker(transport, tmp.path(), delay, three_symbols());

    let mut session = Session::new();
    let started = Instant::now();
    t.refresh_at(&mut session, &now()).unwrap();
    assert_eq!(calls.lock().unwrap().len(), 3);
    assert!(started.elapsed() >= delay * 2);
}

#[test]
fn single_request_is_not_delayed() {
    let delay = Duration::from_millis(500);
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let t = paced_tracker(
        transport,
        tmp.path(),
        delay,
        vec![Symbol::new("RHM.DE", "Rheinmetall")],
    );

    let mut session = Session::new();
    let started = Instant::now();
    t.refresh_at(&mut session, &now()).unwrap();
    assert!(started.elapsed() < delay);
    assert!(!session.report("RHM.DE").unwrap().is_error());
}

#[test]
fn future_custom_date_is_skipped_without_pacing() {
    let delay = Duration::from_millis(300);
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new().route(RELAY_ONE, Reply::Body(healthy_chart()));
    let calls = transport.calls();
    let t = paced_tracker(
        transport,
        tmp.path(),
        delay,
        vec![
            Symbol::new("RHM.DE", "Rheinmetall"),
            Symbol::new("BA.L", "BAE Systems"),
        ],
    );

    // Bypasses the tracker's check, as a hand-edited store would.
    let mut session = Session::new();
    session.add_custom_date(CustomDate::new(1, 1, 2099).unwrap());
    let started = Instant::now();
    t.refresh_at(&mut session, &now()).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(calls.lock().unwrap().len(), 2);
    assert!(elapsed >= delay);
    assert!(elapsed < delay * 2);
    for report in session.reports() {
        assert!(!report.is_error());
        assert_eq!(report.custom_change("01/01/2099"), None);
    }
}

// ---------------------------------------------------------------------------
// Custom dates
// ---------------------------------------------------------------------------

#[test]
fn add_custom_date_rejects_dates_not_in_the_past() {
    let tmp = tempfile::tempdir().unwrap();
    let t = tracker(ScriptedTransport::new(), tmp.path());
    let mut session = Session::new();

    for future in [
        CustomDate::new(16, 6, 2025).unwrap(),
        CustomDate::new(1, 1, 2099).unwrap(),
    ] {
        assert!(matches!(
            t.add_custom_date_at(&mut session, future, &now()),
            Err(TrackerError::InvalidDate(_))
        ));
    }
    assert!(session.custom_dates().is_empty());

    let past = CustomDate::new(1, 6, 2025).unwrap();
    assert!(t.add_custom_date_at(&mut session, past, &now()).unwrap());
    assert!(!t.add_custom_date_at(&mut session, past, &now()).unwrap());
    assert_eq!(session.custom_dates(), &[past]);
}

#[test]
fn custom_changes_are_paced_and_isolated() {
    let delay = Duration::from_millis(40);
    let tmp = tempfile::tempdir().unwrap();
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap().timestamp();
    let transport = ScriptedTransport::new()
        .route(&format!("{}{}", RELAY_ONE, encoded("BA.L")), Reply::Status(500))
        .route(RELAY_ONE, Reply::Body(span_chart(start)));
    let calls = transport.calls();
    let t = paced_tracker(transport, tmp.path(), delay, three_symbols());

    let symbols = three_symbols();
    let date = CustomDate::new(1, 6, 2025).unwrap();
    let started = Instant::now();
    let changes = t.custom_changes_at(&symbols, &date, &now()).unwrap();
    assert!(started.elapsed() >= delay * 2);

    let tickers: Vec<&str> = changes.iter().map(|(s, _)| s.ticker.as_str()).collect();
    assert_eq!(tickers, ["RHM.DE", "BA.L", "HO.PA"]);
    assert!((changes[0].1.as_ref().unwrap() - 20.0).abs() < 1e-9);
    assert!(matches!(changes[1].1, Err(TrackerError::NotFound(_))));
    assert!((changes[2].1.as_ref().unwrap() - 20.0).abs() < 1e-9);
    // BA.L exhausts all three relays.
    assert_eq!(calls.lock().unwrap().len(), 5);
}

#[test]
fn custom_changes_reject_bad_date_before_any_request() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let calls = transport.calls();
    let t = paced_tracker(transport, tmp.path(), Duration::from_secs(5), three_symbols());

    let symbols = three_symbols();
    let future = CustomDate::new(1, 1, 2026).unwrap();
    let started = Instant::now();
    assert!(matches!(
        t.custom_changes_at(&symbols, &future, &now()),
        Err(TrackerError::InvalidDate(_))
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(calls.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Manual sheet
// ---------------------------------------------------------------------------

#[test]
fn manual_cells_only_accept_rendered_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let t = tracker(ScriptedTransport::new(), tmp.path());
    let mut session = Session::new();
    let mut sheet = defense_tracker::ManualSheet::new();

    assert!(matches!(
        t.set_manual_cell(&session, &mut sheet, "RHM.DE", "1w", "3.5"),
        Err(TrackerError::InvalidArgument(_))
    ));
    assert!(matches!(
        t.set_manual_cell(&session, &mut sheet, "XXX", "1W", "3.5"),
        Err(TrackerError::NotFound(_))
    ));
    assert!(matches!(
        t.set_manual_cell(&session, &mut sheet, "RHM.DE", "01/06/2025", "1"),
        Err(TrackerError::InvalidArgument(_))
    ));
    assert!(sheet.is_empty());

    t.set_manual_cell(&session, &mut sheet, "RHM.DE", "1W", "+3.5")
        .unwrap();
    t.add_custom_date_at(&mut session, CustomDate::new(1, 6, 2025).unwrap(), &now())
        .unwrap();
    t.set_manual_cell(&session, &mut sheet, "RHM.DE", "01/06/2025", "-2,5%")
        .unwrap();

    assert_eq!(sheet.get("RHM.DE", "1W"), Some(3.5));
    assert_eq!(sheet.get("RHM.DE", "01/06/2025"), Some(-2.5));
}
