use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use token_chart_widget::api::{
    HoverSample, LegendInput, LegendStyle, find_hovered_candle, format_fixed, render_legend,
};
use token_chart_widget::core::{Candle, DisplayTimeShift, Palette, SeriesData, SeriesKind, Theme};

fn generated_candles(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.05;
            let open = base;
            let close = if i % 2 == 0 { base + 1.0 } else { base - 1.0 };
            Candle::new(
                1_699_999_980 + i as i64 * 60,
                open,
                open.max(close) + 0.75,
                open.min(close) - 0.75,
                close,
            )
            .with_volume(1_000.0 + i as f64, 10.0)
        })
        .collect()
}

fn bench_series_adapter_10k(c: &mut Criterion) {
    let candles = generated_candles(10_000);
    let palette = Palette::for_theme(Theme::Dark);
    let shift = DisplayTimeShift::fixed(3_600);

    c.bench_function("series_adapter_10k", |b| {
        b.iter(|| {
            for kind in [SeriesKind::Candlestick, SeriesKind::Histogram] {
                let _ = SeriesData::from_candles(kind, black_box(&candles), shift, &palette);
            }
        })
    });
}

fn bench_hover_match_10k(c: &mut Criterion) {
    let candles = generated_candles(10_000);
    let shift = DisplayTimeShift::fixed(-18_000);

    c.bench_function("hover_match_10k", |b| {
        b.iter(|| {
            let _ = find_hovered_candle(black_box(&candles), 1_699_999_980 + 301_234, shift);
        })
    });
}

fn bench_legend_render(c: &mut Criterion) {
    let candle = generated_candles(1)[0];
    let palette = Palette::for_theme(Theme::Light);
    let input = LegendInput {
        token_name: "PEPE".to_owned(),
        price: Some(0.000_012_345),
        change_pct: Some(-2.345),
        hover: Some(HoverSample::from_candle(candle)),
    };

    c.bench_function("legend_render_complex", |b| {
        b.iter(|| {
            let _ = render_legend(black_box(&input), LegendStyle::Complex, &palette);
        })
    });
    c.bench_function("format_fixed", |b| {
        b.iter(|| {
            let _ = format_fixed(black_box(12_345.678_9), 2);
        })
    });
}

criterion_group!(
    benches,
    bench_series_adapter_10k,
    bench_hover_match_10k,
    bench_legend_render
);
criterion_main!(benches);
