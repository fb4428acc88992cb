use std::path::PathBuf;
use std::time::Duration;

use crate::models::Symbol;

pub const CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub const CORSPROXY_PREFIX: &str = "https://corsproxy.io/?url=";
pub const ALLORIGINS_RAW_PREFIX: &str = "https://api.allorigins.win/raw?url=";
pub const ALLORIGINS_GET_PREFIX: &str = "https://api.allorigins.win/get?url=";
pub const CODETABS_PREFIX: &str = "https://api.codetabs.com/v1/proxy?quest=";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const SECONDS_PER_DAY: i64 = 86_400;

/// A historical match must be strictly closer than this to its target.
pub const MATCH_TOLERANCE_SECS: i64 = 5 * SECONDS_PER_DAY;

pub const DEFAULT_RANGE: &str = "2y";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const MIN_CUSTOM_YEAR: i32 = 2000;
pub const MAX_CUSTOM_YEAR: i32 = 2100;

// Store keys
pub const PERFORMANCE_CACHE_KEY: &str = "performance_cache";
pub const CUSTOM_DATES_KEY: &str = "custom_dates";
pub const MANUAL_ENTRIES_KEY: &str = "manual_entries";

pub const STORE_KEYS: [&str; 3] = [PERFORMANCE_CACHE_KEY, CUSTOM_DATES_KEY, MANUAL_ENTRIES_KEY];

const CATALOG: [(&str, &str); 10] = [
    ("RHM.DE", "Rheinmetall"),
    ("BA.L", "BAE Systems"),
    ("HO.PA", "Thales"),
    ("LDO.MI", "Leonardo"),
    ("SAAB-B.ST", "Saab"),
    ("AM.PA", "Dassault Aviation"),
    ("HAG.DE", "Hensoldt"),
    ("KOG.OL", "Kongsberg Gruppen"),
    ("R3NK.DE", "Renk"),
    ("SAF.PA", "Safran"),
];

/// The static catalog of tracked equities, in display order.
pub fn symbols() -> Vec<Symbol> {
    CATALOG
        .iter()
        .map(|(ticker, label)| Symbol::new(ticker, label))
        .collect()
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("defense-tracker")
    } else {
        PathBuf::from(".defense-tracker-cache")
    }
}
