use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{SeriesData, SeriesKind, SeriesPoint};
use crate::error::{WidgetError, WidgetResult};
use crate::host::ContainerHandle;
use crate::interaction::{CrosshairHandler, CrosshairMove};

use super::{ChartBackend, ChartFactory, ChartOptions, SeriesId, SeriesOptions};

/// One backend call as observed by [`RecordingChart`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChartCall {
    Create {
        container: ContainerHandle,
        options: ChartOptions,
    },
    AddSeries {
        series: SeriesId,
        kind: SeriesKind,
        pane_index: usize,
    },
    RemoveSeries(SeriesId),
    SetData {
        series: SeriesId,
        data: SeriesData,
    },
    Update {
        series: SeriesId,
        point: SeriesPoint,
    },
    ApplySeriesOptions(SeriesId),
    SetPaneStretchFactor {
        pane_index: usize,
        factor: f64,
    },
    FitContent,
    ScrollToRealTime,
    ApplyOptions(ChartOptions),
    Remove,
}

#[derive(Default)]
struct RecorderState {
    calls: Vec<ChartCall>,
    next_series: u64,
    live_series: Vec<(SeriesId, SeriesKind)>,
    crosshair: Option<CrosshairHandler>,
    removed: bool,
}

/// Shared view over everything a [`RecordingChart`] was asked to do.
///
/// Clones observe the same log, so a test can keep one while the widget
/// owns the boxed chart.
#[derive(Clone, Default)]
pub struct ChartRecorder {
    state: Rc<RefCell<RecorderState>>,
}

impl std::fmt::Debug for ChartRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChartRecorder")
            .field("calls", &state.calls.len())
            .field("live_series", &state.live_series)
            .finish()
    }
}

impl ChartRecorder {
    #[must_use]
    pub fn calls(&self) -> Vec<ChartCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    #[must_use]
    pub fn live_series(&self) -> Vec<(SeriesId, SeriesKind)> {
        self.state.borrow().live_series.clone()
    }

    /// First live series of `kind`, if any.
    #[must_use]
    pub fn series_of_kind(&self, kind: SeriesKind) -> Option<SeriesId> {
        self.state
            .borrow()
            .live_series
            .iter()
            .find(|(_, live_kind)| *live_kind == kind)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn set_data_calls(&self, series: SeriesId) -> Vec<SeriesData> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                ChartCall::SetData { series: id, data } if *id == series => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn update_calls(&self, series: SeriesId) -> Vec<SeriesPoint> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                ChartCall::Update { series: id, point } if *id == series => Some(*point),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count(&self, predicate: impl Fn(&ChartCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(*call)).count()
    }

    /// Delivers a crosshair move to the subscribed handler, if any.
    ///
    /// The handler is detached while it runs so it may call back into the
    /// chart.
    pub fn move_crosshair(&self, event: CrosshairMove) {
        let handler = self.state.borrow_mut().crosshair.take();
        if let Some(mut handler) = handler {
            handler(event);
            let mut state = self.state.borrow_mut();
            if !state.removed && state.crosshair.is_none() {
                state.crosshair = Some(handler);
            }
        }
    }

    fn push(&self, call: ChartCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// Headless chart backend that records calls instead of drawing.
///
/// Used by tests and by hosts that only need the reconciled series data.
#[derive(Debug, Default)]
pub struct RecordingChart {
    recorder: ChartRecorder,
}

impl RecordingChart {
    #[must_use]
    pub fn new(recorder: ChartRecorder) -> Self {
        Self { recorder }
    }

    #[must_use]
    pub fn recorder(&self) -> &ChartRecorder {
        &self.recorder
    }

    fn ensure_live(&self, series: SeriesId) -> WidgetResult<()> {
        if self.recorder.is_removed() {
            return Err(WidgetError::Chart("chart was removed".to_owned()));
        }
        let known = self
            .recorder
            .state
            .borrow()
            .live_series
            .iter()
            .any(|(id, _)| *id == series);
        if known {
            Ok(())
        } else {
            Err(WidgetError::Chart(format!("unknown series {}", series.0)))
        }
    }
}

impl ChartBackend for RecordingChart {
    fn add_series(
        &mut self,
        kind: SeriesKind,
        _options: &SeriesOptions,
        pane_index: usize,
    ) -> WidgetResult<SeriesId> {
        let series = {
            let mut state = self.recorder.state.borrow_mut();
            state.next_series += 1;
            let series = SeriesId(state.next_series);
            state.live_series.push((series, kind));
            series
        };
        self.recorder.push(ChartCall::AddSeries {
            series,
            kind,
            pane_index,
        });
        Ok(series)
    }

    fn remove_series(&mut self, series: SeriesId) -> WidgetResult<()> {
        self.ensure_live(series)?;
        self.recorder
            .state
            .borrow_mut()
            .live_series
            .retain(|(id, _)| *id != series);
        self.recorder.push(ChartCall::RemoveSeries(series));
        Ok(())
    }

    fn set_data(&mut self, series: SeriesId, data: SeriesData) -> WidgetResult<()> {
        self.ensure_live(series)?;
        self.recorder.push(ChartCall::SetData { series, data });
        Ok(())
    }

    fn update(&mut self, series: SeriesId, point: SeriesPoint) -> WidgetResult<()> {
        self.ensure_live(series)?;
        self.recorder.push(ChartCall::Update { series, point });
        Ok(())
    }

    fn apply_series_options(
        &mut self,
        series: SeriesId,
        _options: &SeriesOptions,
    ) -> WidgetResult<()> {
        self.ensure_live(series)?;
        self.recorder.push(ChartCall::ApplySeriesOptions(series));
        Ok(())
    }

    fn set_pane_stretch_factor(&mut self, pane_index: usize, factor: f64) -> WidgetResult<()> {
        self.recorder
            .push(ChartCall::SetPaneStretchFactor { pane_index, factor });
        Ok(())
    }

    fn subscribe_crosshair_move(&mut self, handler: CrosshairHandler) {
        self.recorder.state.borrow_mut().crosshair = Some(handler);
    }

    fn fit_content(&mut self) {
        self.recorder.push(ChartCall::FitContent);
    }

    fn scroll_to_real_time(&mut self) {
        self.recorder.push(ChartCall::ScrollToRealTime);
    }

    fn apply_options(&mut self, options: &ChartOptions) -> WidgetResult<()> {
        self.recorder.push(ChartCall::ApplyOptions(options.clone()));
        Ok(())
    }

    fn remove(&mut self) {
        let mut state = self.recorder.state.borrow_mut();
        state.removed = true;
        state.live_series.clear();
        state.crosshair = None;
        state.calls.push(ChartCall::Remove);
    }
}

/// Factory producing [`RecordingChart`]s that share one recorder.
#[derive(Debug, Clone, Default)]
pub struct RecordingChartFactory {
    recorder: ChartRecorder,
}

impl RecordingChartFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recorder(&self) -> ChartRecorder {
        self.recorder.clone()
    }
}

impl ChartFactory for RecordingChartFactory {
    fn create_chart(
        &mut self,
        container: &ContainerHandle,
        options: &ChartOptions,
    ) -> WidgetResult<Box<dyn ChartBackend>> {
        self.recorder.state.borrow_mut().removed = false;
        self.recorder.push(ChartCall::Create {
            container: container.clone(),
            options: options.clone(),
        });
        Ok(Box::new(RecordingChart::new(self.recorder.clone())))
    }
}
