//! Market-data feed seam.
//!
//! The SDK owns HTTP history loading, the WebSocket transport and its
//! reconnect policy. The widget only drives it through [`MarketDataFeed`]
//! and receives [`FeedEvent`]s through the [`EventSink`] it hands over.

mod config;
#[cfg(feature = "http-client")]
mod http;

pub use config::{FeedConfig, FeedEndpoints, ReconnectPolicy};
#[cfg(feature = "http-client")]
pub use http::ReqwestHttpClient;

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::EventSink;
use crate::core::{ChartData, Trade};
use crate::error::WidgetResult;

/// Query parameters and headers for one GET, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub params: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
}

impl HttpRequest {
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_owned(), value.into());
        self
    }
}

/// Minimal HTTP capability injected into the feed.
pub trait HttpClient {
    /// Performs a GET and returns the response body as text.
    fn get(&self, url: &str, request: &HttpRequest) -> WidgetResult<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub is_connected: bool,
    pub token_id: Option<String>,
}

/// Notifications a feed pushes into the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// Full candle snapshot.
    ChartUpdate(ChartData),
    Trade(Trade),
    /// Transport or SDK error, forwarded verbatim.
    Error(String),
    ConnectionStatus(bool),
}

/// Operations the widget drives on a market-data SDK instance.
pub trait MarketDataFeed {
    /// Loads token metadata and, when `with_history`, the historical candles.
    ///
    /// Implementations may deliver events through the sink before returning.
    fn initialize(&mut self, token_id: &str, with_history: bool) -> WidgetResult<()>;

    fn subscribe(&mut self, token_id: &str) -> WidgetResult<()>;

    fn subscription_status(&self) -> SubscriptionStatus;

    fn connect_websocket(&mut self) -> WidgetResult<()>;

    fn destroy(&mut self);
}

/// Builds a feed bound to the widget's event sink.
pub trait FeedFactory {
    fn create_feed(
        &mut self,
        config: &FeedConfig,
        http: Option<Rc<dyn HttpClient>>,
        sink: EventSink,
    ) -> WidgetResult<Box<dyn MarketDataFeed>>;
}
