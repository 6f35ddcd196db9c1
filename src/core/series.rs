use serde::{Deserialize, Serialize};

use crate::core::{
    Candle, CandlePoint, DisplayTimeShift, LinePoint, Palette, VolumePoint, to_candle_point,
    to_line_point, to_volume_point,
};

/// Series kinds the widget creates on the chart backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Candlestick,
    Line,
    Histogram,
}

/// One point for a single-point upsert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeriesPoint {
    Candle(CandlePoint),
    Line(LinePoint),
    Volume(VolumePoint),
}

impl SeriesPoint {
    #[must_use]
    pub fn from_candle(
        kind: SeriesKind,
        candle: &Candle,
        shift: DisplayTimeShift,
        palette: &Palette,
    ) -> Self {
        match kind {
            SeriesKind::Candlestick => Self::Candle(to_candle_point(candle, shift)),
            SeriesKind::Line => Self::Line(to_line_point(candle, shift)),
            SeriesKind::Histogram => Self::Volume(to_volume_point(candle, shift, palette)),
        }
    }

    #[must_use]
    pub fn time(&self) -> i64 {
        match self {
            Self::Candle(point) => point.time,
            Self::Line(point) => point.time,
            Self::Volume(point) => point.time,
        }
    }
}

/// Full point list for a `set_data` replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesData {
    Candles(Vec<CandlePoint>),
    Line(Vec<LinePoint>),
    Volume(Vec<VolumePoint>),
}

impl SeriesData {
    /// Converts the whole candle sequence for one series kind, computing the
    /// display shift once for the batch.
    #[must_use]
    pub fn from_candles(
        kind: SeriesKind,
        candles: &[Candle],
        shift: DisplayTimeShift,
        palette: &Palette,
    ) -> Self {
        match kind {
            SeriesKind::Candlestick => Self::Candles(
                candles
                    .iter()
                    .map(|candle| to_candle_point(candle, shift))
                    .collect(),
            ),
            SeriesKind::Line => Self::Line(
                candles
                    .iter()
                    .map(|candle| to_line_point(candle, shift))
                    .collect(),
            ),
            SeriesKind::Histogram => Self::Volume(
                candles
                    .iter()
                    .map(|candle| to_volume_point(candle, shift, palette))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Candles(points) => points.len(),
            Self::Line(points) => points.len(),
            Self::Volume(points) => points.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
