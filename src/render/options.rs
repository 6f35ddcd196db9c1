use serde::{Deserialize, Serialize};

use crate::core::{Color, Palette, SeriesKind};
use crate::interaction::CrosshairMode;

/// Chart-level configuration handed to the backend at construction and on
/// every `apply_options` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// Fixed width; `None` lets the backend track the container.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub layout: LayoutOptions,
    pub grid: GridOptions,
    pub crosshair_mode: CrosshairMode,
    pub crosshair_color: Color,
    pub price_scale_margins: PriceScaleMargins,
    pub time_scale: TimeScaleOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub background: Color,
    pub text_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    pub vert_lines: Color,
    pub horz_lines: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScaleMargins {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeScaleOptions {
    pub time_visible: bool,
    pub seconds_visible: bool,
    pub border_visible: bool,
}

impl ChartOptions {
    #[must_use]
    pub fn themed(palette: &Palette) -> Self {
        Self {
            width: None,
            height: None,
            layout: LayoutOptions {
                background: palette.background,
                text_color: palette.text,
            },
            grid: GridOptions {
                vert_lines: palette.grid,
                horz_lines: palette.grid,
            },
            crosshair_mode: CrosshairMode::Normal,
            crosshair_color: palette.crosshair,
            price_scale_margins: PriceScaleMargins {
                top: 0.1,
                bottom: 0.1,
            },
            time_scale: TimeScaleOptions {
                time_visible: true,
                seconds_visible: false,
                border_visible: false,
            },
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Re-colors layout/grid/crosshair while keeping size and scale settings.
    pub fn apply_palette(&mut self, palette: &Palette) {
        self.layout.background = palette.background;
        self.layout.text_color = palette.text;
        self.grid.vert_lines = palette.grid;
        self.grid.horz_lines = palette.grid;
        self.crosshair_color = palette.crosshair;
    }
}

pub const VOLUME_PRICE_SCALE_ID: &str = "volume";

/// Per-kind series styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesOptions {
    Candlestick {
        up_color: Color,
        down_color: Color,
        wick_up_color: Color,
        wick_down_color: Color,
        border_visible: bool,
    },
    Line {
        color: Color,
        line_width: u32,
    },
    Histogram {
        /// Volume bars carry their own per-point color.
        base_color: Color,
        price_scale_id: String,
    },
}

impl SeriesOptions {
    #[must_use]
    pub fn themed(kind: SeriesKind, palette: &Palette) -> Self {
        match kind {
            SeriesKind::Candlestick => Self::Candlestick {
                up_color: palette.up,
                down_color: palette.down,
                wick_up_color: palette.up,
                wick_down_color: palette.down,
                border_visible: false,
            },
            SeriesKind::Line => Self::Line {
                color: palette.line,
                line_width: 2,
            },
            SeriesKind::Histogram => Self::Histogram {
                base_color: palette.volume_up,
                price_scale_id: VOLUME_PRICE_SCALE_ID.to_owned(),
            },
        }
    }
}
