#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use token_chart_widget::api::{Collaborators, EventSink, WidgetHandle, WidgetOptions};
use token_chart_widget::core::{Candle, ChartData, Trade, Viewport};
use token_chart_widget::error::{WidgetError, WidgetResult};
use token_chart_widget::feed::{
    FeedConfig, FeedFactory, HttpClient, MarketDataFeed, SubscriptionStatus,
};
use token_chart_widget::host::{ElementId, MemoryHost};
use token_chart_widget::render::{ChartRecorder, RecordingChartFactory};
use token_chart_widget::scheduler::ManualScheduler;

pub const CONTAINER: &str = "#c";
pub const CONTAINER_SIZE: Viewport = Viewport {
    width: 800,
    height: 400,
};
/// Minute-aligned UTC seconds.
pub const BASE_TS: i64 = 1_699_999_980;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedCall {
    Initialize { token_id: String, with_history: bool },
    Subscribe(String),
    ConnectWebsocket,
    Destroy,
}

#[derive(Default)]
struct FeedState {
    sink: Option<EventSink>,
    calls: Vec<FeedCall>,
    connected: bool,
    history: Option<Vec<Candle>>,
    initialize_error: Option<String>,
    create_error: Option<String>,
    created: usize,
}

/// Market-data feed double driven by the test.
///
/// Clones share state; the widget owns one boxed clone while the test keeps
/// another to push events and inspect calls.
#[derive(Clone, Default)]
pub struct ScriptedFeed {
    state: Rc<RefCell<FeedState>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candles delivered as a snapshot from inside `initialize`.
    pub fn with_history(self, candles: Vec<Candle>) -> Self {
        self.state.borrow_mut().history = Some(candles);
        self
    }

    pub fn connected(self, connected: bool) -> Self {
        self.set_connected(connected);
        self
    }

    pub fn failing_initialize(self, message: &str) -> Self {
        self.state.borrow_mut().initialize_error = Some(message.to_owned());
        self
    }

    pub fn failing_create(self, message: &str) -> Self {
        self.state.borrow_mut().create_error = Some(message.to_owned());
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.borrow_mut().connected = connected;
    }

    pub fn calls(&self) -> Vec<FeedCall> {
        self.state.borrow().calls.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FeedCall::Subscribe(token) => Some(token),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> usize {
        self.state.borrow().created
    }

    pub fn sink(&self) -> EventSink {
        self.state
            .borrow()
            .sink
            .clone()
            .unwrap_or_else(EventSink::detached)
    }

    pub fn snapshot(&self, candles: Vec<Candle>) {
        self.sink().chart_update(ChartData::from_candles(candles));
    }

    pub fn trade(&self, trade: Trade) {
        self.sink().trade(trade);
    }

    fn record(&self, call: FeedCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl MarketDataFeed for ScriptedFeed {
    fn initialize(&mut self, token_id: &str, with_history: bool) -> WidgetResult<()> {
        self.record(FeedCall::Initialize {
            token_id: token_id.to_owned(),
            with_history,
        });
        let (failure, history) = {
            let state = self.state.borrow();
            (state.initialize_error.clone(), state.history.clone())
        };
        if let Some(message) = failure {
            return Err(WidgetError::DataLoad(message));
        }
        if let Some(candles) = history {
            self.snapshot(candles);
        }
        Ok(())
    }

    fn subscribe(&mut self, token_id: &str) -> WidgetResult<()> {
        self.record(FeedCall::Subscribe(token_id.to_owned()));
        Ok(())
    }

    fn subscription_status(&self) -> SubscriptionStatus {
        SubscriptionStatus {
            is_connected: self.state.borrow().connected,
            token_id: None,
        }
    }

    fn connect_websocket(&mut self) -> WidgetResult<()> {
        self.record(FeedCall::ConnectWebsocket);
        Ok(())
    }

    fn destroy(&mut self) {
        self.record(FeedCall::Destroy);
    }
}

impl FeedFactory for ScriptedFeed {
    fn create_feed(
        &mut self,
        _config: &FeedConfig,
        _http: Option<Rc<dyn HttpClient>>,
        sink: EventSink,
    ) -> WidgetResult<Box<dyn MarketDataFeed>> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.create_error.clone() {
            return Err(WidgetError::Feed(message));
        }
        state.created += 1;
        state.sink = Some(sink);
        drop(state);
        Ok(Box::new(self.clone()))
    }
}

/// Host, chart recorder, feed and clock wired together for one widget.
pub struct Harness {
    pub host: MemoryHost,
    pub charts: RecordingChartFactory,
    pub recorder: ChartRecorder,
    pub feed: ScriptedFeed,
    pub scheduler: ManualScheduler,
}

impl Harness {
    pub fn new(feed: ScriptedFeed) -> Self {
        let charts = RecordingChartFactory::new();
        let recorder = charts.recorder();
        Self {
            host: MemoryHost::new().with_element(CONTAINER, CONTAINER_SIZE),
            charts,
            recorder,
            feed,
            scheduler: ManualScheduler::new(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.host.clone(),
            self.charts.clone(),
            self.feed.clone(),
            Rc::new(self.scheduler.clone()),
        )
    }

    pub fn create(&self, options: WidgetOptions) -> WidgetHandle {
        token_chart_widget::create(options, self.collaborators()).expect("widget create")
    }

    pub fn element(&self) -> ElementId {
        self.host.element_id(CONTAINER).expect("container registered")
    }

    pub fn advance(&self, millis: u64) {
        self.scheduler.advance(Duration::from_millis(millis));
    }
}

pub fn options() -> WidgetOptions {
    WidgetOptions::new(CONTAINER).with_utc_offset_seconds(0)
}

/// Three ascending minute candles, the last one up.
pub fn three_candles() -> Vec<Candle> {
    vec![
        Candle::new(BASE_TS, 1.00, 1.20, 0.90, 1.10).with_volume(100.0, 90.0),
        Candle::new(BASE_TS + 60, 1.10, 1.15, 1.00, 1.05).with_volume(80.0, 75.0),
        Candle::new(BASE_TS + 120, 1.05, 1.30, 1.04, 1.25).with_volume(120.0, 100.0),
    ]
}
