//! Domain model and the candle-to-series data adapter.

pub mod candlestick;
pub mod histogram_series;
pub mod line_series;
pub mod palette;
pub mod primitives;
pub mod series;
pub mod time_shift;
pub mod types;

pub use candlestick::{CandlePoint, to_candle_point};
pub use histogram_series::{VolumePoint, to_volume_point};
pub use line_series::{LinePoint, to_line_point};
pub use palette::{Color, Palette, Theme};
pub use series::{SeriesData, SeriesKind, SeriesPoint};
pub use time_shift::DisplayTimeShift;
pub use types::{Candle, ChartData, Trade, Viewport};
