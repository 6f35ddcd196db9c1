use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::minute_bucket;

/// Container size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// One OHLCV aggregate as delivered by the market-data feed.
///
/// `timestamp` is the bucket start in UTC seconds. It is the canonical
/// identity of a candle; display shifting happens only at the chart hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Quote-currency (USD) volume.
    pub volume_in: f64,
    /// Base-currency volume.
    pub volume_out: f64,
    #[serde(default)]
    pub transactions: u64,
}

impl Candle {
    #[must_use]
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume_in: 0.0,
            volume_out: 0.0,
            transactions: 0,
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume_in: f64, volume_out: f64) -> Self {
        self.volume_in = volume_in;
        self.volume_out = volume_out;
        self
    }

    /// Returns `true` when close is greater than or equal to open.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    /// Folds one trade into this candle.
    pub fn absorb_trade(&mut self, trade: &Trade) {
        self.close = trade.price;
        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.volume_in += trade.amount_usd;
        self.volume_out += trade.amount;
        self.transactions += 1;
    }
}

/// A single executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    /// Traded base-currency amount.
    pub amount: f64,
    /// Traded quote-currency (USD) value.
    pub amount_usd: f64,
    /// UTC seconds.
    pub timestamp: i64,
}

impl Trade {
    #[must_use]
    pub fn minute_bucket(&self) -> Option<i64> {
        minute_bucket(self.timestamp)
    }
}

/// Candle sequence plus load bookkeeping, replaced wholesale per snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChartData {
    #[must_use]
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            last_update: Some(Utc::now()),
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn last_candle(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Latest close, if any candle exists.
    #[must_use]
    pub fn current_price(&self) -> Option<f64> {
        self.candles.last().map(|candle| candle.close)
    }

    /// Percentage change from the first open to the last close.
    #[must_use]
    pub fn window_change_pct(&self) -> Option<f64> {
        let first = self.candles.first()?;
        let last = self.candles.last()?;
        if !first.open.is_finite() || first.open <= 0.0 {
            return None;
        }
        Some((last.close - first.open) / first.open * 100.0)
    }
}
