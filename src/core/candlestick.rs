use serde::{Deserialize, Serialize};

use crate::core::{Candle, DisplayTimeShift};

/// Price-bar point handed to a candlestick series.
///
/// `time` is display-shifted seconds; never compare it against candle
/// timestamps without reversing the shift first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[must_use]
pub fn to_candle_point(candle: &Candle, shift: DisplayTimeShift) -> CandlePoint {
    CandlePoint {
        time: shift.to_display(candle.timestamp),
        open: candle.open,
        high: candle.high,
        low: candle.low,
        close: candle.close,
    }
}
