use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Rendered for missing or non-finite values.
pub const PLACEHOLDER: &str = "--";

/// Formats with exactly `decimals` fraction digits.
///
/// Rounds half away from zero on the shortest decimal form of `value`, so
/// `2.345` renders as `2.35` even though its binary value sits just below
/// the midpoint. Values outside `Decimal` range fall back to the standard
/// float formatter.
#[must_use]
pub fn format_fixed(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_owned();
    }
    match round_half_away(value, decimals) {
        Some(rounded) => rounded.to_string(),
        None => format!("{value:.prec$}", prec = decimals as usize),
    }
}

fn round_half_away(value: f64, decimals: u32) -> Option<Decimal> {
    let decimal = Decimal::from_str(&value.to_string()).ok()?;
    let mut rounded =
        decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(decimals);
    Some(rounded)
}

/// Price with two decimals, placeholder when absent.
#[must_use]
pub fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| PLACEHOLDER.to_owned(), |value| format_fixed(value, 2))
}

/// Percentage with two decimals and a trailing `%`, placeholder when absent.
#[must_use]
pub fn format_percent(pct: Option<f64>) -> String {
    match pct.filter(|value| value.is_finite()) {
        Some(value) => format!("{}%", format_fixed(value, 2)),
        None => PLACEHOLDER.to_owned(),
    }
}

const VOLUME_TIERS: [(f64, &str); 4] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

/// Compact volume: `950.00`, `1.23K`, `4.56M`, `7.89B`.
///
/// The suffix follows the rounded value, so `999_999.999` is `1.00M`.
#[must_use]
pub fn format_volume(volume: Option<f64>) -> String {
    let Some(value) = volume.filter(|value| value.is_finite()) else {
        return PLACEHOLDER.to_owned();
    };
    let magnitude = value.abs();
    let mut tier = VOLUME_TIERS
        .iter()
        .rposition(|(divisor, _)| magnitude >= *divisor)
        .unwrap_or(0);
    let thousand = Decimal::from(1_000);
    while tier + 1 < VOLUME_TIERS.len()
        && round_half_away(value / VOLUME_TIERS[tier].0, 2)
            .is_some_and(|rounded| rounded.abs() >= thousand)
    {
        tier += 1;
    }
    let (divisor, suffix) = VOLUME_TIERS[tier];
    format!("{}{suffix}", format_fixed(value / divisor, 2))
}

/// `(close - open) / open * 100`, zero when `open <= 0`.
#[must_use]
pub fn bar_change_pct(open: f64, close: f64) -> f64 {
    if open > 0.0 {
        (close - open) / open * 100.0
    } else {
        0.0
    }
}

/// `(high - low) / open * 100`, zero when `open <= 0`.
#[must_use]
pub fn bar_fluctuation_pct(open: f64, high: f64, low: f64) -> f64 {
    if open > 0.0 {
        (high - low) / open * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_formatting_pads_and_rounds_half_away_from_zero() {
        assert_eq!(format_fixed(1.5, 2), "1.50");
        assert_eq!(format_fixed(-1.005, 2), "-1.01");
        assert_eq!(format_fixed(0.0, 2), "0.00");
        assert_eq!(format_fixed(-0.001, 2), "0.00");
        assert_eq!(format_fixed(12_345.678, 2), "12345.68");
    }

    #[test]
    fn out_of_range_values_fall_back_to_float_formatting() {
        assert_eq!(format_fixed(f64::NAN, 2), PLACEHOLDER);
        assert_eq!(format_fixed(1e30, 2), format!("{:.2}", 1e30));
    }

    #[test]
    fn volume_uses_compact_suffixes() {
        assert_eq!(format_volume(Some(950.0)), "950.00");
        assert_eq!(format_volume(Some(1_234.0)), "1.23K");
        assert_eq!(format_volume(Some(4_560_000.0)), "4.56M");
        assert_eq!(format_volume(Some(7_890_000_000.0)), "7.89B");
        assert_eq!(format_volume(None), PLACEHOLDER);
    }

    #[test]
    fn volume_suffix_follows_rounded_value() {
        assert_eq!(format_volume(Some(999.999)), "1.00K");
        assert_eq!(format_volume(Some(999_999.999)), "1.00M");
        assert_eq!(format_volume(Some(-999_999_999.999)), "-1.00B");
        assert_eq!(format_volume(Some(999.994)), "999.99");
        assert_eq!(format_volume(Some(0.5)), "0.50");
    }

    #[test]
    fn bar_metrics_guard_non_positive_open() {
        assert_eq!(bar_change_pct(0.0, 5.0), 0.0);
        assert_eq!(bar_fluctuation_pct(-1.0, 5.0, 1.0), 0.0);
        assert!((bar_change_pct(2.0, 3.0) - 50.0).abs() < 1e-12);
        assert!((bar_fluctuation_pct(2.0, 3.0, 1.5) - 75.0).abs() < 1e-12);
    }
}
