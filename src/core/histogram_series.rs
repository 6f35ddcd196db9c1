use serde::{Deserialize, Serialize};

use crate::core::{Candle, Color, DisplayTimeShift, Palette};

/// Volume bar handed to a histogram series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub time: i64,
    pub value: f64,
    pub color: Color,
}

/// Maps quote-currency volume to a bar colored by candle direction.
#[must_use]
pub fn to_volume_point(candle: &Candle, shift: DisplayTimeShift, palette: &Palette) -> VolumePoint {
    VolumePoint {
        time: shift.to_display(candle.timestamp),
        value: candle.volume_in,
        color: if candle.is_up() {
            palette.volume_up
        } else {
            palette.volume_down
        },
    }
}
