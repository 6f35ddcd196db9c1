//! token-chart-widget: an embeddable live price chart for one token.
//!
//! [`create`] mounts a chart into a host container, loads candle history
//! through a market-data feed and keeps the chart current from live
//! snapshots and trades. The chart library, the feed SDK and the host page
//! are trait seams ([`render::ChartBackend`], [`feed::MarketDataFeed`],
//! [`host::HostSurface`]); in-memory implementations of the chart and host
//! ship with the crate for tests and headless use.

pub mod api;
pub mod core;
pub mod error;
pub mod feed;
pub mod host;
pub mod interaction;
pub mod render;
pub mod scheduler;
pub mod telemetry;

pub use api::{
    Collaborators, EventSink, LegendStyle, PriceSeriesType, WidgetHandle, WidgetOptions,
    WidgetState, create,
};
pub use error::{WidgetError, WidgetResult};
