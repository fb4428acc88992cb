use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Symbol: A tracked equity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub ticker: String,
    pub label: String,
}

impl Symbol {
    pub fn new(ticker: &str, label: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            label: label.to_string(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.ticker)
    }
}
