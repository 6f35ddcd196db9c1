use chrono::{Local, Offset};
use serde::{Deserialize, Serialize};

/// Display-only shift applied to UTC timestamps at the chart hand-off.
///
/// The chart backend treats times as naive UTC, so adding the viewer's UTC
/// offset makes its axis read as local time. Canonical candle identity stays
/// in UTC; use [`DisplayTimeShift::to_utc`] to map a display time back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayTimeShift {
    pub offset_seconds: i32,
}

impl DisplayTimeShift {
    /// Reads the viewer's current local offset once.
    #[must_use]
    pub fn local() -> Self {
        Self {
            offset_seconds: Local::now().offset().fix().local_minus_utc(),
        }
    }

    #[must_use]
    pub const fn fixed(offset_seconds: i32) -> Self {
        Self { offset_seconds }
    }

    #[must_use]
    pub const fn utc() -> Self {
        Self { offset_seconds: 0 }
    }

    #[must_use]
    pub fn to_display(self, utc_seconds: i64) -> i64 {
        utc_seconds + i64::from(self.offset_seconds)
    }

    #[must_use]
    pub fn to_utc(self, display_seconds: i64) -> i64 {
        display_seconds - i64::from(self.offset_seconds)
    }
}
