use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PricePoint: One (timestamp, close) sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Close price, `None` when the provider reported no trade.
    pub price: Option<f64>,
}

// ---------------------------------------------------------------------------
// PriceSeries: Ascending price samples for one symbol
// ---------------------------------------------------------------------------

/// Time-ordered price samples returned by a single chart fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from parallel timestamp and close arrays.
    ///
    /// Returns `None` if the arrays differ in length.
    pub fn from_parallel(timestamps: &[i64], closes: &[Option<f64>]) -> Option<Self> {
        if timestamps.len() != closes.len() {
            return None;
        }
        let points = timestamps
            .iter()
            .zip(closes)
            .map(|(&timestamp, &price)| PricePoint { timestamp, price })
            .collect();
        Some(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the points that carry a price.
    pub fn priced(&self) -> impl DoubleEndedIterator<Item = (i64, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|p| p.price.map(|price| (p.timestamp, price)))
    }

    /// First non-absent close.
    pub fn first_price(&self) -> Option<f64> {
        self.priced().next().map(|(_, price)| price)
    }

    /// Last non-absent close.
    pub fn latest_price(&self) -> Option<f64> {
        self.priced().next_back().map(|(_, price)| price)
    }
}
