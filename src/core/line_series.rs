use serde::{Deserialize, Serialize};

use crate::core::{Candle, DisplayTimeShift};

/// Single-value point handed to a line series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub time: i64,
    pub value: f64,
}

/// Line series plot the close price.
#[must_use]
pub fn to_line_point(candle: &Candle, shift: DisplayTimeShift) -> LinePoint {
    LinePoint {
        time: shift.to_display(candle.timestamp),
        value: candle.close,
    }
}
