use std::rc::{Rc, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::core::{ChartData, DisplayTimeShift, Palette, SeriesKind, Theme, Trade, Viewport};
use crate::error::{WidgetError, WidgetResult};
use crate::feed::{FeedEvent, FeedFactory, HttpClient, MarketDataFeed};
use crate::host::{ContainerHandle, HostSurface};
use crate::interaction::CrosshairMove;
use crate::render::{ChartBackend, ChartFactory, ChartOptions};
use crate::scheduler::Scheduler;

use super::dispatch::{Command, EventSink, Notification, Notifications, Shared};
use super::legend::{HoverSample, LegendInput, LegendView, render_legend};
use super::reconciler::{SnapshotPlan, UpdateReconciler};
use super::series_set::SeriesSet;
use super::{LegendStyle, PriceSeriesType, WidgetCallbacks, WidgetOptions};

/// Delay between `initialize` and the first readiness check.
pub const SUBSCRIBE_GRACE_DELAY: Duration = Duration::from_secs(1);
/// Interval between readiness checks.
pub const SUBSCRIBE_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Readiness checks stop after this much waiting; no subscribe is issued.
pub const SUBSCRIBE_WAIT_CEILING: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetState {
    Uninitialized,
    Initializing,
    Ready,
    /// Terminal; every later call is a no-op.
    Destroyed,
}

/// External collaborators a widget is built from.
pub struct Collaborators {
    pub host: Box<dyn HostSurface>,
    pub charts: Box<dyn ChartFactory>,
    pub feeds: Box<dyn FeedFactory>,
    pub http: Option<Rc<dyn HttpClient>>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        host: impl HostSurface + 'static,
        charts: impl ChartFactory + 'static,
        feeds: impl FeedFactory + 'static,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            host: Box::new(host),
            charts: Box::new(charts),
            feeds: Box::new(feeds),
            http: None,
            scheduler,
        }
    }

    #[must_use]
    pub fn with_http_client(mut self, http: Rc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }
}

/// Owns the chart, the feed and all widget state. Only reached through
/// [`Shared::dispatch`].
pub(super) struct Controller {
    state: WidgetState,
    options: WidgetOptions,
    palette: Palette,
    container: ContainerHandle,
    host: Box<dyn HostSurface>,
    chart: Option<Box<dyn ChartBackend>>,
    chart_options: ChartOptions,
    series: SeriesSet,
    feed: Option<Box<dyn MarketDataFeed>>,
    scheduler: Rc<dyn Scheduler>,
    reconciler: UpdateReconciler,
    chart_data: ChartData,
    shift: DisplayTimeShift,
    hover: Option<HoverSample>,
    legend: Option<LegendView>,
    token_id: Option<String>,
    generation: u64,
}

impl Controller {
    fn new(
        options: WidgetOptions,
        container: ContainerHandle,
        host: Box<dyn HostSurface>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        let palette = Palette::for_theme(options.theme);
        let chart_options = ChartOptions::themed(&palette);
        let reconciler = UpdateReconciler::new(options.reconcile);
        let mut controller = Self {
            state: WidgetState::Uninitialized,
            options,
            palette,
            container,
            host,
            chart: None,
            chart_options,
            series: SeriesSet::default(),
            feed: None,
            scheduler,
            reconciler,
            chart_data: ChartData::default(),
            shift: DisplayTimeShift::utc(),
            hover: None,
            legend: None,
            token_id: None,
            generation: 0,
        };
        controller.shift = controller.current_shift();
        controller
    }

    pub(super) fn state(&self) -> WidgetState {
        self.state
    }

    pub(super) fn chart_data(&self) -> &ChartData {
        &self.chart_data
    }

    pub(super) fn legend(&self) -> Option<&LegendView> {
        self.legend.as_ref()
    }

    pub(super) fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }

    fn set_state(&mut self, next: WidgetState) {
        debug!(from = ?self.state, to = ?next, "widget state transition");
        self.state = next;
    }

    /// Reads the display offset once for a hand-off batch.
    fn current_shift(&self) -> DisplayTimeShift {
        self.options
            .utc_offset_seconds
            .map_or_else(DisplayTimeShift::local, DisplayTimeShift::fixed)
    }

    fn resolve_size(&self, width: Option<u32>, height: Option<u32>) -> (Option<u32>, Option<u32>) {
        let container_size = self.host.container_size(&self.container);
        let pick = |requested: Option<u32>, from_container: fn(Viewport) -> u32| {
            requested.or_else(|| {
                container_size
                    .filter(|size| size.is_valid())
                    .map(from_container)
            })
        };
        (
            pick(width, |size| size.width),
            pick(height, |size| size.height),
        )
    }

    /// Creates the chart and its series in the container.
    fn mount(&mut self, charts: &mut dyn ChartFactory) -> WidgetResult<()> {
        self.set_state(WidgetState::Initializing);
        let (width, height) = self.resolve_size(self.options.width, self.options.height);
        self.chart_options = ChartOptions::themed(&self.palette).with_size(width, height);

        let chart = charts.create_chart(&self.container, &self.chart_options)?;
        let chart = self.chart.insert(chart);
        let price_kind = self.options.price_series_type.series_kind();
        self.series
            .create_price(chart.as_mut(), price_kind, &self.palette)?;
        if self.options.show_volume {
            self.series.create_volume(chart.as_mut(), &self.palette)?;
        }
        self.refresh_legend();
        Ok(())
    }

    fn attach(&mut self, sink: &EventSink, feed: Box<dyn MarketDataFeed>) {
        if let Some(chart) = self.chart.as_mut() {
            let sink = sink.clone();
            chart.subscribe_crosshair_move(Box::new(move |event| sink.crosshair(event)));
        }
        self.feed = Some(feed);
    }

    /// Tears down whatever `mount` created after a failed construction.
    fn abort(&mut self) {
        if let Some(mut chart) = self.chart.take() {
            chart.remove();
        }
        self.series.clear();
        self.host.clear_container(&self.container);
        self.set_state(WidgetState::Destroyed);
    }

    pub(super) fn handle(&mut self, command: Command, shared: Weak<Shared>) -> Notifications {
        let mut out = Notifications::new();
        if matches!(
            self.state,
            WidgetState::Destroyed | WidgetState::Uninitialized
        ) {
            trace!(state = ?self.state, ?command, "dropping command");
            return out;
        }

        match command {
            Command::Start => self.start(shared, &mut out),
            Command::Feed(FeedEvent::ChartUpdate(data)) => self.on_snapshot(data, &mut out),
            Command::Feed(FeedEvent::Trade(trade)) => self.on_trade(trade, &mut out),
            Command::Feed(FeedEvent::Error(message)) => {
                warn!(%message, "market-data feed error");
                self.notify_error(message, &mut out);
            }
            Command::Feed(FeedEvent::ConnectionStatus(connected)) => {
                info!(connected, "market-data connection status");
                if let Some(callback) = self.options.callbacks.on_connection_change.clone() {
                    out.push(Notification::Connection(callback, connected));
                }
            }
            Command::Crosshair(event) => self.on_crosshair(&event),
            Command::LoadToken(token_id) => self.load_token(token_id, shared, &mut out),
            Command::PollSubscription {
                generation,
                elapsed,
            } => self.poll_subscription(generation, elapsed, shared, &mut out),
            Command::Resize { width, height } => self.resize(width, height),
            Command::SetShowVolume(show) => self.set_show_volume(show),
            Command::SetPriceSeriesType(series_type) => self.set_price_series_type(series_type),
            Command::SetTheme(theme) => self.set_theme(theme),
            Command::Destroy => self.destroy(),
        }
        out
    }

    fn notify_error(&self, message: String, out: &mut Notifications) {
        if let Some(callback) = self.options.callbacks.on_error.clone() {
            out.push(Notification::Error(callback, message));
        }
    }

    fn start(&mut self, shared: Weak<Shared>, out: &mut Notifications) {
        if let Some(feed) = self.feed.as_mut() {
            if let Err(err) = feed.connect_websocket() {
                warn!(error = %err, "websocket connect failed");
                self.notify_error(err.to_string(), out);
            }
        }
        if let Some(token_id) = self.options.token_id.clone() {
            self.load_token(token_id, shared, out);
        }
        if self.state == WidgetState::Initializing {
            self.set_state(WidgetState::Ready);
        }
    }

    fn load_token(&mut self, token_id: String, shared: Weak<Shared>, out: &mut Notifications) {
        self.generation += 1;
        let generation = self.generation;
        info!(%token_id, generation, "loading token data");

        self.options.token_id = Some(token_id.clone());
        self.token_id = Some(token_id.clone());
        self.reconciler.reset();
        self.hover = None;
        self.chart_data = ChartData {
            loading: true,
            ..ChartData::default()
        };
        self.refresh_legend();

        let Some(feed) = self.feed.as_mut() else {
            return;
        };
        if let Err(err) = feed.initialize(&token_id, true) {
            let message = match err {
                WidgetError::DataLoad(message) => message,
                other => other.to_string(),
            };
            warn!(%token_id, error = %message, "token data load failed");
            self.chart_data.loading = false;
            self.chart_data.error = Some(message.clone());
            self.refresh_legend();
            self.notify_error(message, out);
            return;
        }

        self.schedule_poll(shared, generation, Duration::ZERO, SUBSCRIBE_GRACE_DELAY);
    }

    fn schedule_poll(
        &self,
        shared: Weak<Shared>,
        generation: u64,
        elapsed: Duration,
        delay: Duration,
    ) {
        let sink = EventSink::new(shared);
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                sink.send(Command::PollSubscription {
                    generation,
                    elapsed,
                });
            }),
        );
    }

    fn poll_subscription(
        &mut self,
        generation: u64,
        elapsed: Duration,
        shared: Weak<Shared>,
        out: &mut Notifications,
    ) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "superseded subscription wait"
            );
            return;
        }
        let (Some(feed), Some(token_id)) = (self.feed.as_mut(), self.token_id.clone()) else {
            return;
        };

        if feed.subscription_status().is_connected {
            debug!(%token_id, waited_ms = elapsed.as_millis() as u64, "subscribing");
            if let Err(err) = feed.subscribe(&token_id) {
                warn!(%token_id, error = %err, "subscribe failed");
                self.notify_error(err.to_string(), out);
            }
            return;
        }
        if elapsed >= SUBSCRIBE_WAIT_CEILING {
            warn!(
                %token_id,
                waited_ms = elapsed.as_millis() as u64,
                "transport not connected; giving up on subscribe"
            );
            return;
        }
        self.schedule_poll(
            shared,
            generation,
            elapsed + SUBSCRIBE_POLL_INTERVAL,
            SUBSCRIBE_POLL_INTERVAL,
        );
    }

    fn on_snapshot(&mut self, data: ChartData, out: &mut Notifications) {
        self.chart_data = data;
        let plan = self.reconciler.plan_snapshot(self.chart_data.candles.len());
        self.shift = self.current_shift();

        if let Some(chart) = self.chart.as_mut() {
            match plan {
                SnapshotPlan::FullReplace => self.series.replace_all(
                    chart.as_mut(),
                    &self.chart_data.candles,
                    self.shift,
                    &self.palette,
                ),
                SnapshotPlan::LiveUpdate => {
                    if let Some(last) = self.chart_data.candles.last() {
                        self.series
                            .upsert(chart.as_mut(), last, self.shift, &self.palette);
                        chart.scroll_to_real_time();
                    }
                }
            }
        }

        self.resync_hover();
        self.refresh_legend();
        if let Some(callback) = self.options.callbacks.on_data_update.clone() {
            out.push(Notification::DataUpdate(callback, self.chart_data.clone()));
        }
    }

    fn on_trade(&mut self, trade: Trade, out: &mut Notifications) {
        if let Some(callback) = self.options.callbacks.on_trade.clone() {
            out.push(Notification::Trade(callback, trade));
        }

        let Some(merged) = self
            .reconciler
            .merge_trade(&mut self.chart_data.candles, &trade)
        else {
            return;
        };
        trace!(
            timestamp = merged.timestamp,
            close = merged.close,
            "merged trade into last candle"
        );
        self.chart_data.last_update = Some(Utc::now());
        self.shift = self.current_shift();
        if let Some(chart) = self.chart.as_mut() {
            self.series
                .upsert(chart.as_mut(), &merged, self.shift, &self.palette);
        }
        self.resync_hover();
        self.refresh_legend();
    }

    /// Rebuilds the hovered bar from the current candle with the same
    /// timestamp; drops it when that candle is gone.
    fn resync_hover(&mut self) {
        let Some(hovered) = self.hover.and_then(|hover| hover.candle) else {
            return;
        };
        self.hover = self
            .chart_data
            .candles
            .iter()
            .find(|candle| candle.timestamp == hovered.timestamp)
            .map(|candle| HoverSample::from_candle(*candle));
    }

    fn on_crosshair(&mut self, event: &CrosshairMove) {
        if self.options.legend_style != LegendStyle::Complex {
            return;
        }
        let Some((price_series, _)) = self.series.price() else {
            return;
        };
        self.hover = HoverSample::from_crosshair(
            event,
            price_series,
            self.series.volume(),
            &self.chart_data.candles,
            self.shift,
        );
        self.refresh_legend();
    }

    fn resize(&mut self, width: Option<u32>, height: Option<u32>) {
        let (width, height) = self.resolve_size(width, height);
        self.chart_options.width = width.or(self.chart_options.width);
        self.chart_options.height = height.or(self.chart_options.height);
        debug!(?width, ?height, "resize chart");
        if let Some(chart) = self.chart.as_mut() {
            if let Err(err) = chart.apply_options(&self.chart_options) {
                warn!(error = %err, "failed to apply resized chart options");
            }
        }
    }

    fn set_show_volume(&mut self, show: bool) {
        self.options.show_volume = show;
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        match (show, self.series.volume()) {
            (true, None) => match self.series.create_volume(chart.as_mut(), &self.palette) {
                Ok(id) => {
                    if !self.chart_data.candles.is_empty() {
                        SeriesSet::replace_one(
                            chart.as_mut(),
                            (id, SeriesKind::Histogram),
                            &self.chart_data.candles,
                            self.shift,
                            &self.palette,
                        );
                    }
                }
                Err(err) => warn!(error = %err, "failed to create volume series"),
            },
            (false, Some(_)) => self.series.remove_volume(chart.as_mut()),
            _ => {}
        }
    }

    fn set_price_series_type(&mut self, series_type: PriceSeriesType) {
        let kind = series_type.series_kind();
        if self.series.price().map(|(_, live)| live) == Some(kind) {
            return;
        }
        self.options.price_series_type = series_type;
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        self.series.remove_price(chart.as_mut());
        match self.series.create_price(chart.as_mut(), kind, &self.palette) {
            Ok(id) => {
                if !self.chart_data.candles.is_empty() {
                    SeriesSet::replace_one(
                        chart.as_mut(),
                        (id, kind),
                        &self.chart_data.candles,
                        self.shift,
                        &self.palette,
                    );
                }
            }
            Err(err) => warn!(error = %err, ?kind, "failed to create price series"),
        }
        self.hover = None;
        self.refresh_legend();
    }

    fn set_theme(&mut self, theme: Theme) {
        if self.options.theme == theme {
            return;
        }
        self.options.theme = theme;
        self.palette = Palette::for_theme(theme);
        self.chart_options.apply_palette(&self.palette);
        if let Some(chart) = self.chart.as_mut() {
            if let Err(err) = chart.apply_options(&self.chart_options) {
                warn!(error = %err, "failed to apply themed chart options");
            }
            self.series.restyle(chart.as_mut(), &self.palette);
            // Volume bars carry per-point colors.
            if let Some(volume) = self.series.volume() {
                SeriesSet::replace_one(
                    chart.as_mut(),
                    (volume, SeriesKind::Histogram),
                    &self.chart_data.candles,
                    self.shift,
                    &self.palette,
                );
            }
        }
        self.refresh_legend();
    }

    fn destroy(&mut self) {
        info!(token_id = ?self.token_id, "destroying widget");
        // Invalidate any pending subscription wait.
        self.generation += 1;
        if let Some(mut feed) = self.feed.take() {
            feed.destroy();
        }
        if let Some(mut chart) = self.chart.take() {
            chart.remove();
        }
        self.series.clear();
        self.hover = None;
        self.legend = None;
        self.host.clear_container(&self.container);
        self.options.callbacks = WidgetCallbacks::default();
        self.set_state(WidgetState::Destroyed);
    }

    fn refresh_legend(&mut self) {
        let input = LegendInput {
            token_name: self.options.display_name(),
            price: self.chart_data.current_price(),
            change_pct: self.chart_data.window_change_pct(),
            hover: self.hover,
        };
        self.legend = render_legend(&input, self.options.legend_style, &self.palette);
        self.host.render_legend(&self.container, self.legend.as_ref());
    }
}

/// Handle returned by [`create`]. Dropping it destroys the widget.
pub struct WidgetHandle {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Mounts a chart into `options.container` and starts streaming.
///
/// Fails fast with [`WidgetError::ContainerNotFound`] when the container does
/// not resolve, and with the collaborator's error when the chart or feed
/// cannot be constructed. Data-load and transport failures later on are
/// reported through `on_error` and leave the widget alive.
pub fn create(options: WidgetOptions, collaborators: Collaborators) -> WidgetResult<WidgetHandle> {
    let Collaborators {
        host,
        mut charts,
        mut feeds,
        http,
        scheduler,
    } = collaborators;

    let container = host.resolve_container(&options.container).ok_or_else(|| {
        WidgetError::ContainerNotFound {
            target: options.container.to_string(),
        }
    })?;
    debug!(container = %options.container, element = container.element.0, "resolved container");

    let feed_config = options.feed.clone();
    let mut controller = Controller::new(options, container, host, scheduler);
    if let Err(err) = controller.mount(charts.as_mut()) {
        controller.abort();
        return Err(err);
    }

    let shared = Rc::new(Shared::new(controller));
    let sink = EventSink::new(Rc::downgrade(&shared));
    let feed = match feeds.create_feed(&feed_config, http, sink.clone()) {
        Ok(feed) => feed,
        Err(err) => {
            warn!(error = %err, "market-data feed construction failed");
            shared.controller.borrow_mut().abort();
            return Err(err);
        }
    };
    shared.controller.borrow_mut().attach(&sink, feed);
    shared.dispatch(Command::Start);
    Ok(WidgetHandle { shared })
}

impl WidgetHandle {
    #[must_use]
    pub fn state(&self) -> WidgetState {
        self.shared.state.get()
    }

    /// Copy of the current chart data.
    ///
    /// Must not be called from inside a collaborator method; host callbacks
    /// are fine.
    #[must_use]
    pub fn chart_data(&self) -> ChartData {
        self.shared.controller.borrow().chart_data().clone()
    }

    #[must_use]
    pub fn legend(&self) -> Option<LegendView> {
        self.shared.controller.borrow().legend().cloned()
    }

    #[must_use]
    pub fn token_id(&self) -> Option<String> {
        self.shared.controller.borrow().token_id().map(str::to_owned)
    }

    /// Switches to another token; any pending subscription wait for the
    /// previous token is abandoned.
    pub fn load_token(&self, token_id: &str) {
        self.shared.dispatch(Command::LoadToken(token_id.to_owned()));
    }

    /// Resizes the chart; missing dimensions come from the container.
    pub fn resize(&self, width: Option<u32>, height: Option<u32>) {
        self.shared.dispatch(Command::Resize { width, height });
    }

    pub fn set_show_volume(&self, show: bool) {
        self.shared.dispatch(Command::SetShowVolume(show));
    }

    pub fn set_price_series_type(&self, series_type: PriceSeriesType) {
        self.shared
            .dispatch(Command::SetPriceSeriesType(series_type));
    }

    pub fn set_theme(&self, theme: Theme) {
        self.shared.dispatch(Command::SetTheme(theme));
    }

    /// Releases the feed and the chart. Idempotent.
    pub fn destroy(&self) {
        self.shared.dispatch(Command::Destroy);
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        if self.state() != WidgetState::Destroyed {
            self.shared.dispatch(Command::Destroy);
        }
    }
}
