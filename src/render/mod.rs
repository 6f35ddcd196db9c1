//! Chart backend seam.
//!
//! The widget never draws. It hands series points and options to a
//! [`ChartBackend`] (a Lightweight-Charts-style library) built by a
//! [`ChartFactory`] for the resolved container.

mod options;
mod recording_chart;

pub use options::{
    ChartOptions, GridOptions, LayoutOptions, PriceScaleMargins, SeriesOptions, TimeScaleOptions,
    VOLUME_PRICE_SCALE_ID,
};
pub use recording_chart::{ChartCall, ChartRecorder, RecordingChart, RecordingChartFactory};

use serde::{Deserialize, Serialize};

use crate::core::{SeriesData, SeriesKind, SeriesPoint};
use crate::error::WidgetResult;
use crate::host::ContainerHandle;
use crate::interaction::CrosshairHandler;

/// Backend-assigned series handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(pub u64);

/// Operations the widget needs from a charting library instance.
pub trait ChartBackend {
    fn add_series(
        &mut self,
        kind: SeriesKind,
        options: &SeriesOptions,
        pane_index: usize,
    ) -> WidgetResult<SeriesId>;

    fn remove_series(&mut self, series: SeriesId) -> WidgetResult<()>;

    /// Full replace of a series' points.
    fn set_data(&mut self, series: SeriesId, data: SeriesData) -> WidgetResult<()>;

    /// Single-point upsert: replaces the point at the same time or appends.
    fn update(&mut self, series: SeriesId, point: SeriesPoint) -> WidgetResult<()>;

    fn apply_series_options(&mut self, series: SeriesId, options: &SeriesOptions)
    -> WidgetResult<()>;

    fn set_pane_stretch_factor(&mut self, pane_index: usize, factor: f64) -> WidgetResult<()>;

    fn subscribe_crosshair_move(&mut self, handler: CrosshairHandler);

    fn fit_content(&mut self);

    fn scroll_to_real_time(&mut self);

    fn apply_options(&mut self, options: &ChartOptions) -> WidgetResult<()>;

    /// Tears the chart down. No other call follows.
    fn remove(&mut self);
}

/// Builds a chart instance mounted into a container.
pub trait ChartFactory {
    fn create_chart(
        &mut self,
        container: &ContainerHandle,
        options: &ChartOptions,
    ) -> WidgetResult<Box<dyn ChartBackend>>;
}
