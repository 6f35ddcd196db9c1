//! Widget controller, update reconciler and legend renderer.

mod dispatch;
mod legend;
mod legend_format;
mod options;
mod reconciler;
mod series_set;
mod widget;

pub use dispatch::EventSink;
pub use legend::{
    HOVER_MATCH_TOLERANCE_SECS, HoverSample, LegendInput, LegendLine, LegendSpan, LegendView,
    find_hovered_candle, render_legend,
};
pub use legend_format::{
    PLACEHOLDER, bar_change_pct, bar_fluctuation_pct, format_fixed, format_percent,
    format_price, format_volume,
};
pub use options::{
    ConnectionCallback, DataUpdateCallback, ErrorCallback, LegendStyle, PriceSeriesType,
    TokenId, TradeCallback, WidgetCallbacks, WidgetOptions,
};
pub use reconciler::{ReconcileConfig, SnapshotPlan, UpdateReconciler};
pub use widget::{
    Collaborators, SUBSCRIBE_GRACE_DELAY, SUBSCRIBE_POLL_INTERVAL, SUBSCRIBE_WAIT_CEILING,
    WidgetHandle, WidgetState, create,
};
