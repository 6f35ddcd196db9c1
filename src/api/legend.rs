use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Candle, Color, DisplayTimeShift, Palette};
use crate::interaction::{CrosshairMove, HoverValue};
use crate::render::SeriesId;

use super::LegendStyle;
use super::legend_format::{
    bar_change_pct, bar_fluctuation_pct, format_percent, format_price, format_volume,
};

/// Largest distance, in seconds, between a hover time and a matched candle.
pub const HOVER_MATCH_TOLERANCE_SECS: i64 = 60;

/// OHLC/volume under the crosshair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoverSample {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    /// Candle matched by time, if one lies within tolerance.
    pub candle: Option<Candle>,
}

impl HoverSample {
    #[must_use]
    pub fn from_candle(candle: Candle) -> Self {
        Self {
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: Some(candle.volume_in),
            candle: Some(candle),
        }
    }

    /// Builds the hover sample for a crosshair move.
    ///
    /// Bar samples from the price series win; line samples borrow OHLC from
    /// the matched candle when one exists.
    #[must_use]
    pub fn from_crosshair(
        event: &CrosshairMove,
        price_series: SeriesId,
        volume_series: Option<SeriesId>,
        candles: &[Candle],
        shift: DisplayTimeShift,
    ) -> Option<Self> {
        let time = event.time?;
        let candle = find_hovered_candle(candles, time, shift).copied();
        let volume = volume_series
            .and_then(|series| match event.sample(series) {
                Some(HoverValue::Value(value)) => Some(value),
                _ => None,
            })
            .or_else(|| candle.map(|candle| candle.volume_in));

        let mut sample = match (event.sample(price_series), candle) {
            (Some(HoverValue::Bar { open, high, low, close }), _) => Self {
                open,
                high,
                low,
                close,
                volume: None,
                candle,
            },
            (Some(HoverValue::Value(_)) | None, Some(candle)) => Self::from_candle(candle),
            (Some(HoverValue::Value(value)), None) => Self {
                open: value,
                high: value,
                low: value,
                close: value,
                volume: None,
                candle: None,
            },
            (None, None) => return None,
        };
        sample.volume = volume;
        Some(sample)
    }

    #[must_use]
    pub fn change_pct(&self) -> f64 {
        bar_change_pct(self.open, self.close)
    }

    #[must_use]
    pub fn fluctuation_pct(&self) -> f64 {
        bar_fluctuation_pct(self.open, self.high, self.low)
    }
}

/// Finds the candle nearest to a display-space hover time.
///
/// The display shift is reversed first so matching runs on canonical UTC
/// timestamps. `candles` must be sorted by timestamp.
#[must_use]
pub fn find_hovered_candle(
    candles: &[Candle],
    hovered_display_time: i64,
    shift: DisplayTimeShift,
) -> Option<&Candle> {
    let target = shift.to_utc(hovered_display_time);
    let split = candles.partition_point(|candle| candle.timestamp < target);
    let before = split.checked_sub(1).and_then(|index| candles.get(index));
    let after = candles.get(split);
    let nearest = match (before, after) {
        (Some(before), Some(after)) => {
            if target - before.timestamp <= after.timestamp - target {
                before
            } else {
                after
            }
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => return None,
    };
    ((nearest.timestamp - target).abs() <= HOVER_MATCH_TOLERANCE_SECS).then_some(nearest)
}

/// Everything the legend shows, independent of styling.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendInput {
    pub token_name: String,
    pub price: Option<f64>,
    /// Change over the loaded window, in percent.
    pub change_pct: Option<f64>,
    pub hover: Option<HoverSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSpan {
    pub label: Option<String>,
    pub text: String,
    pub color: Color,
}

impl LegendSpan {
    fn value(text: String, color: Color) -> Self {
        Self {
            label: None,
            text,
            color,
        }
    }

    fn labeled(label: &str, text: String, color: Color) -> Self {
        Self {
            label: Some(label.to_owned()),
            text,
            color,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendLine {
    pub spans: SmallVec<[LegendSpan; 6]>,
}

/// Structured legend content handed to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendView {
    pub lines: Vec<LegendLine>,
}

impl LegendView {
    /// Finds the first span with `label`.
    #[must_use]
    pub fn span(&self, label: &str) -> Option<&LegendSpan> {
        self.lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .find(|span| span.label.as_deref() == Some(label))
    }

    /// HTML fragment with one `div` per line and inline span colors.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str("<div class=\"legend-line\">");
            for span in &line.spans {
                if let Some(label) = &span.label {
                    out.push_str("<span class=\"legend-label\">");
                    out.push_str(&escape_html(label));
                    out.push_str("</span>");
                }
                out.push_str("<span style=\"color: ");
                out.push_str(&span.color.to_css());
                out.push_str("\">");
                out.push_str(&escape_html(&span.text));
                out.push_str("</span>");
            }
            out.push_str("</div>");
        }
        out
    }
}

impl fmt::Display for LegendView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line_index, line) in self.lines.iter().enumerate() {
            if line_index > 0 {
                writeln!(f)?;
            }
            for (span_index, span) in line.spans.iter().enumerate() {
                if span_index > 0 {
                    f.write_str("  ")?;
                }
                if let Some(label) = &span.label {
                    write!(f, "{label} ")?;
                }
                f.write_str(&span.text)?;
            }
        }
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn sign_color(value: Option<f64>, palette: &Palette) -> Color {
    match value.filter(|value| value.is_finite()) {
        Some(value) => palette.direction_color(value >= 0.0),
        None => palette.muted_text,
    }
}

/// Renders the legend for `style`. Never fails; absent data degrades to
/// placeholders. Returns `None` for [`LegendStyle::None`].
#[must_use]
pub fn render_legend(
    input: &LegendInput,
    style: LegendStyle,
    palette: &Palette,
) -> Option<LegendView> {
    if style == LegendStyle::None {
        return None;
    }

    let mut header = LegendLine::default();
    header
        .spans
        .push(LegendSpan::value(input.token_name.clone(), palette.text));
    header
        .spans
        .push(LegendSpan::labeled("Price", format_price(input.price), palette.text));
    header.spans.push(LegendSpan::labeled(
        "24h",
        format_percent(input.change_pct),
        sign_color(input.change_pct, palette),
    ));

    let mut view = LegendView {
        lines: vec![header],
    };

    if style == LegendStyle::Complex {
        if let Some(hover) = &input.hover {
            let bar_color = palette.direction_color(hover.close >= hover.open);
            let mut ohlc = LegendLine::default();
            for (label, value) in [
                ("O", hover.open),
                ("H", hover.high),
                ("L", hover.low),
                ("C", hover.close),
            ] {
                ohlc.spans
                    .push(LegendSpan::labeled(label, format_price(Some(value)), bar_color));
            }
            ohlc.spans.push(LegendSpan::labeled(
                "Vol",
                format_volume(hover.volume),
                palette.muted_text,
            ));

            let change = hover.change_pct();
            let mut metrics = LegendLine::default();
            metrics.spans.push(LegendSpan::labeled(
                "Chg",
                format_percent(Some(change)),
                sign_color(Some(change), palette),
            ));
            metrics.spans.push(LegendSpan::labeled(
                "Fluct",
                format_percent(Some(hover.fluctuation_pct())),
                palette.muted_text,
            ));
            view.lines.push(ohlc);
            view.lines.push(metrics);
        }
    }

    Some(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Theme;

    fn candles() -> Vec<Candle> {
        vec![
            Candle::new(600, 1.0, 2.0, 0.5, 1.5),
            Candle::new(660, 1.5, 1.8, 1.2, 1.3),
            Candle::new(720, 1.3, 1.4, 1.0, 1.1),
        ]
    }

    #[test]
    fn hover_match_reverses_display_shift() {
        let shift = DisplayTimeShift::fixed(3_600);
        let candles = candles();
        let matched = find_hovered_candle(&candles, 660 + 3_600, shift).expect("match");
        assert_eq!(matched.timestamp, 660);

        let near = find_hovered_candle(&candles, 700 + 3_600, shift).expect("nearest");
        assert_eq!(near.timestamp, 720);
    }

    #[test]
    fn hover_match_rejects_times_beyond_tolerance() {
        let shift = DisplayTimeShift::utc();
        let candles = candles();
        assert!(find_hovered_candle(&candles, 539, shift).is_none());
        assert_eq!(
            find_hovered_candle(&candles, 540, shift).map(|c| c.timestamp),
            Some(600)
        );
        assert_eq!(
            find_hovered_candle(&candles, 780, shift).map(|c| c.timestamp),
            Some(720)
        );
        assert!(find_hovered_candle(&candles, 781, shift).is_none());
        assert!(find_hovered_candle(&[], 600, shift).is_none());
    }

    #[test]
    fn simple_style_omits_hover_rows() {
        let palette = Palette::for_theme(Theme::Light);
        let input = LegendInput {
            token_name: "PEPE".to_owned(),
            price: Some(1.0),
            change_pct: Some(-3.0),
            hover: Some(HoverSample::from_candle(candles()[0])),
        };
        let view = render_legend(&input, LegendStyle::Simple, &palette).expect("legend");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.span("24h").map(|s| s.color), Some(palette.down));
        assert!(render_legend(&input, LegendStyle::None, &palette).is_none());
    }

    #[test]
    fn markup_escapes_token_name() {
        let palette = Palette::for_theme(Theme::Dark);
        let input = LegendInput {
            token_name: "<b>&</b>".to_owned(),
            price: None,
            change_pct: None,
            hover: None,
        };
        let markup = render_legend(&input, LegendStyle::Complex, &palette)
            .expect("legend")
            .to_markup();
        assert!(markup.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert!(!markup.contains("<b>"));
    }
}
