use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::{ChartData, SeriesKind, Theme, Trade};
use crate::error::{WidgetError, WidgetResult};
use crate::feed::FeedConfig;
use crate::host::ContainerTarget;

use super::ReconcileConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSeriesType {
    #[default]
    Candle,
    Line,
}

impl PriceSeriesType {
    #[must_use]
    pub fn series_kind(self) -> SeriesKind {
        match self {
            Self::Candle => SeriesKind::Candlestick,
            Self::Line => SeriesKind::Line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendStyle {
    None,
    Simple,
    #[default]
    Complex,
}

pub type ErrorCallback = Rc<dyn Fn(&str)>;
pub type DataUpdateCallback = Rc<dyn Fn(&ChartData)>;
pub type TradeCallback = Rc<dyn Fn(&Trade)>;
pub type ConnectionCallback = Rc<dyn Fn(bool)>;

/// Fire-and-forget notifications to the embedding page.
#[derive(Clone, Default)]
pub struct WidgetCallbacks {
    pub on_error: Option<ErrorCallback>,
    pub on_data_update: Option<DataUpdateCallback>,
    pub on_trade: Option<TradeCallback>,
    pub on_connection_change: Option<ConnectionCallback>,
}

impl fmt::Debug for WidgetCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetCallbacks")
            .field("on_error", &self.on_error.is_some())
            .field("on_data_update", &self.on_data_update.is_some())
            .field("on_trade", &self.on_trade.is_some())
            .field("on_connection_change", &self.on_connection_change.is_some())
            .finish()
    }
}

/// User-facing widget configuration.
///
/// Only defaulting is applied; the container is checked when the widget is
/// created. Callbacks are skipped by serde so the rest can be loaded from
/// JSON with [`WidgetOptions::from_json_str`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetOptions {
    pub container: ContainerTarget,
    /// `"<chainId>-<tokenAddress>"`.
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub show_volume: bool,
    #[serde(default)]
    pub price_series_type: PriceSeriesType,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub legend_style: LegendStyle,
    /// Fixed display offset; `None` reads the viewer's local offset.
    #[serde(default)]
    pub utc_offset_seconds: Option<i32>,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(skip)]
    pub callbacks: WidgetCallbacks,
}

impl WidgetOptions {
    #[must_use]
    pub fn new(container: impl Into<ContainerTarget>) -> Self {
        Self {
            container: container.into(),
            token_id: None,
            symbol: None,
            width: None,
            height: None,
            show_volume: false,
            price_series_type: PriceSeriesType::default(),
            theme: Theme::default(),
            legend_style: LegendStyle::default(),
            utc_offset_seconds: None,
            reconcile: ReconcileConfig::default(),
            feed: FeedConfig::default(),
            callbacks: WidgetCallbacks::default(),
        }
    }

    pub fn from_json_str(input: &str) -> WidgetResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| WidgetError::InvalidOptions(format!("failed to parse options json: {e}")))
    }

    #[must_use]
    pub fn with_token(mut self, token_id: &str) -> Self {
        self.token_id = Some(token_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_owned());
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_volume(mut self, show_volume: bool) -> Self {
        self.show_volume = show_volume;
        self
    }

    #[must_use]
    pub fn with_price_series_type(mut self, series_type: PriceSeriesType) -> Self {
        self.price_series_type = series_type;
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn with_legend_style(mut self, legend_style: LegendStyle) -> Self {
        self.legend_style = legend_style;
        self
    }

    #[must_use]
    pub fn with_utc_offset_seconds(mut self, offset_seconds: i32) -> Self {
        self.utc_offset_seconds = Some(offset_seconds);
        self
    }

    #[must_use]
    pub fn with_reconcile_config(mut self, reconcile: ReconcileConfig) -> Self {
        self.reconcile = reconcile;
        self
    }

    #[must_use]
    pub fn with_feed_config(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.callbacks.on_error = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_data_update(mut self, callback: impl Fn(&ChartData) + 'static) -> Self {
        self.callbacks.on_data_update = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_trade(mut self, callback: impl Fn(&Trade) + 'static) -> Self {
        self.callbacks.on_trade = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_connection_change(mut self, callback: impl Fn(bool) + 'static) -> Self {
        self.callbacks.on_connection_change = Some(Rc::new(callback));
        self
    }

    /// Legend title: explicit symbol, else a shortened token address.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(symbol) = self.symbol.as_deref().filter(|s| !s.is_empty()) {
            return symbol.to_owned();
        }
        self.token_id
            .as_deref()
            .map(TokenId::parse)
            .map_or_else(|| "--".to_owned(), |token| token.short_address())
    }
}

/// `"<chainId>-<tokenAddress>"` split for display.
///
/// Parsing never fails: without a `-` the whole input is the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenId {
    pub chain_id: Option<String>,
    pub address: String,
}

impl TokenId {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('-') {
            Some((chain, address)) if !chain.is_empty() => Self {
                chain_id: Some(chain.to_owned()),
                address: address.to_owned(),
            },
            _ => Self {
                chain_id: None,
                address: raw.to_owned(),
            },
        }
    }

    /// `0x1234...abcd` for long addresses, unchanged otherwise.
    #[must_use]
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 12 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}
