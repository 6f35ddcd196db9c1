use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::core::{Candle, DisplayTimeShift, Palette, SeriesData, SeriesKind, SeriesPoint};
use crate::error::WidgetResult;
use crate::render::{ChartBackend, SeriesId, SeriesOptions};

pub(super) const PRICE_PANE: usize = 0;
pub(super) const VOLUME_PANE: usize = 1;
const PRICE_PANE_STRETCH: f64 = 3.0;
const VOLUME_PANE_STRETCH: f64 = 1.0;
const SOLE_PANE_STRETCH: f64 = 1.0;

/// Live series handles on one chart.
///
/// Exactly one price series (candlestick or line) exists while mounted; the
/// volume histogram exists iff volume is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct SeriesSet {
    price: Option<(SeriesId, SeriesKind)>,
    volume: Option<SeriesId>,
}

impl SeriesSet {
    pub(super) fn price(&self) -> Option<(SeriesId, SeriesKind)> {
        self.price
    }

    pub(super) fn volume(&self) -> Option<SeriesId> {
        self.volume
    }

    pub(super) fn active(&self) -> SmallVec<[(SeriesId, SeriesKind); 2]> {
        let mut active = SmallVec::new();
        if let Some(price) = self.price {
            active.push(price);
        }
        if let Some(volume) = self.volume {
            active.push((volume, SeriesKind::Histogram));
        }
        active
    }

    pub(super) fn create_price(
        &mut self,
        chart: &mut dyn ChartBackend,
        kind: SeriesKind,
        palette: &Palette,
    ) -> WidgetResult<SeriesId> {
        let id = chart.add_series(kind, &SeriesOptions::themed(kind, palette), PRICE_PANE)?;
        debug!(series = id.0, ?kind, "created price series");
        self.price = Some((id, kind));
        Ok(id)
    }

    pub(super) fn remove_price(&mut self, chart: &mut dyn ChartBackend) {
        if let Some((id, kind)) = self.price.take() {
            if let Err(err) = chart.remove_series(id) {
                warn!(error = %err, series = id.0, ?kind, "failed to remove price series");
            }
        }
    }

    pub(super) fn create_volume(
        &mut self,
        chart: &mut dyn ChartBackend,
        palette: &Palette,
    ) -> WidgetResult<SeriesId> {
        let id = chart.add_series(
            SeriesKind::Histogram,
            &SeriesOptions::themed(SeriesKind::Histogram, palette),
            VOLUME_PANE,
        )?;
        for (pane, factor) in [
            (PRICE_PANE, PRICE_PANE_STRETCH),
            (VOLUME_PANE, VOLUME_PANE_STRETCH),
        ] {
            if let Err(err) = chart.set_pane_stretch_factor(pane, factor) {
                warn!(error = %err, pane, "failed to set pane stretch factor");
            }
        }
        debug!(series = id.0, "created volume series");
        self.volume = Some(id);
        Ok(id)
    }

    /// Removes the volume histogram and gives the price pane the full height.
    pub(super) fn remove_volume(&mut self, chart: &mut dyn ChartBackend) {
        let Some(id) = self.volume.take() else {
            return;
        };
        if let Err(err) = chart.remove_series(id) {
            warn!(error = %err, series = id.0, "failed to remove volume series");
        }
        if let Err(err) = chart.set_pane_stretch_factor(PRICE_PANE, SOLE_PANE_STRETCH) {
            warn!(error = %err, pane = PRICE_PANE, "failed to reset pane stretch factor");
        }
    }

    pub(super) fn restyle(&self, chart: &mut dyn ChartBackend, palette: &Palette) {
        for (id, kind) in self.active() {
            if let Err(err) = chart.apply_series_options(id, &SeriesOptions::themed(kind, palette)) {
                warn!(error = %err, series = id.0, ?kind, "failed to restyle series");
            }
        }
    }

    /// Recomputes one series from the full candle sequence.
    pub(super) fn replace_one(
        chart: &mut dyn ChartBackend,
        (id, kind): (SeriesId, SeriesKind),
        candles: &[Candle],
        shift: DisplayTimeShift,
        palette: &Palette,
    ) {
        let data = SeriesData::from_candles(kind, candles, shift, palette);
        trace!(series = id.0, ?kind, points = data.len(), "set series data");
        if let Err(err) = chart.set_data(id, data) {
            warn!(error = %err, series = id.0, ?kind, "failed to set series data");
        }
    }

    /// Full replace of every active series, then fit all content.
    pub(super) fn replace_all(
        &self,
        chart: &mut dyn ChartBackend,
        candles: &[Candle],
        shift: DisplayTimeShift,
        palette: &Palette,
    ) {
        for series in self.active() {
            Self::replace_one(chart, series, candles, shift, palette);
        }
        chart.fit_content();
    }

    /// Single-point upsert of `candle` on every active series.
    pub(super) fn upsert(
        &self,
        chart: &mut dyn ChartBackend,
        candle: &Candle,
        shift: DisplayTimeShift,
        palette: &Palette,
    ) {
        for (id, kind) in self.active() {
            let point = SeriesPoint::from_candle(kind, candle, shift, palette);
            if let Err(err) = chart.update(id, point) {
                warn!(
                    error = %err,
                    series = id.0,
                    ?kind,
                    time = point.time(),
                    "skipping rejected series update"
                );
            }
        }
    }

    pub(super) fn clear(&mut self) {
        self.price = None;
        self.volume = None;
    }
}
