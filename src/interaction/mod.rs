use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::render::SeriesId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrosshairMode {
    /// Crosshair follows raw pointer position without snapping.
    #[default]
    Normal,
    /// Crosshair follows nearest data sample.
    Magnet,
    /// Crosshair remains hidden regardless of pointer movement.
    Hidden,
}

/// Value a series reports under the crosshair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HoverValue {
    Bar {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
    Value(f64),
}

/// Crosshair-move notification delivered by the chart backend.
///
/// `time` is in display-shifted seconds, the same space the widget handed
/// to the backend. `None` means the pointer left the plot area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrosshairMove {
    pub time: Option<i64>,
    pub samples: SmallVec<[(SeriesId, HoverValue); 2]>,
}

impl CrosshairMove {
    #[must_use]
    pub fn left() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(time: i64) -> Self {
        Self {
            time: Some(time),
            samples: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_sample(mut self, series: SeriesId, value: HoverValue) -> Self {
        self.samples.push((series, value));
        self
    }

    #[must_use]
    pub fn sample(&self, series: SeriesId) -> Option<HoverValue> {
        self.samples
            .iter()
            .find(|(id, _)| *id == series)
            .map(|(_, value)| *value)
    }
}

/// Handler registered through `ChartBackend::subscribe_crosshair_move`.
pub type CrosshairHandler = Box<dyn FnMut(CrosshairMove)>;
