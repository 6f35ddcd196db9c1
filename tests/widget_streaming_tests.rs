mod common;

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use common::{BASE_TS, FeedCall, Harness, ScriptedFeed, options, three_candles};
use token_chart_widget::WidgetHandle;
use token_chart_widget::api::{PriceSeriesType, format_fixed};
use token_chart_widget::core::{Candle, ChartData, SeriesData, SeriesKind, SeriesPoint, Trade};
use token_chart_widget::render::ChartCall;

fn line_values(data: &SeriesData) -> Vec<f64> {
    match data {
        SeriesData::Line(points) => points.iter().map(|p| p.value).collect(),
        other => panic!("expected line data, got {other:?}"),
    }
}

#[test]
fn snapshot_then_trade_merges_into_last_candle() {
    let harness = Harness::new(
        ScriptedFeed::new()
            .with_history(three_candles())
            .connected(true),
    );
    let trades = Rc::new(RefCell::new(Vec::new()));
    let widget = {
        let trades = Rc::clone(&trades);
        harness.create(
            options()
                .with_token("1-0xabc")
                .with_price_series_type(PriceSeriesType::Line)
                .with_volume(true)
                .on_trade(move |trade| trades.borrow_mut().push(*trade)),
        )
    };

    let line = harness
        .recorder
        .series_of_kind(SeriesKind::Line)
        .expect("line series");
    let volume = harness
        .recorder
        .series_of_kind(SeriesKind::Histogram)
        .expect("volume series");

    let line_sets = harness.recorder.set_data_calls(line);
    assert_eq!(line_sets.len(), 1);
    assert_eq!(line_values(&line_sets[0]), vec![1.10, 1.05, 1.25]);
    let volume_sets = harness.recorder.set_data_calls(volume);
    assert_eq!(volume_sets.len(), 1);
    assert_eq!(volume_sets[0].len(), 3);
    assert_eq!(harness.recorder.count(|call| *call == ChartCall::FitContent), 1);

    harness.feed.trade(Trade {
        price: 1.40,
        amount: 10.0,
        amount_usd: 14.0,
        timestamp: BASE_TS + 150,
    });

    let line_updates = harness.recorder.update_calls(line);
    assert_eq!(line_updates.len(), 1);
    match line_updates[0] {
        SeriesPoint::Line(point) => {
            assert_eq!(point.time, BASE_TS + 120);
            assert_relative_eq!(point.value, 1.40);
        }
        other => panic!("expected line point, got {other:?}"),
    }
    let volume_updates = harness.recorder.update_calls(volume);
    assert_eq!(volume_updates.len(), 1);
    match volume_updates[0] {
        SeriesPoint::Volume(point) => assert_relative_eq!(point.value, 134.0),
        other => panic!("expected volume point, got {other:?}"),
    }
    assert_eq!(harness.recorder.set_data_calls(line).len(), 1);

    let legend = harness.host.legend(harness.element()).expect("legend");
    assert_eq!(
        legend.span("Price").map(|span| span.text.clone()),
        Some(format_fixed(1.40, 2))
    );
    assert_eq!(trades.borrow().len(), 1);

    let data = widget.chart_data();
    let last = data.last_candle().expect("last candle");
    assert_relative_eq!(last.close, 1.40);
    assert_relative_eq!(last.high, 1.40);
    assert_eq!(last.transactions, 1);
}

#[test]
fn trade_outside_merge_window_only_reaches_callback() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let trades = Rc::new(RefCell::new(0usize));
    let widget = {
        let trades = Rc::clone(&trades);
        harness.create(
            options()
                .with_token("1-0xabc")
                .on_trade(move |_| *trades.borrow_mut() += 1),
        )
    };
    let price = harness
        .recorder
        .series_of_kind(SeriesKind::Candlestick)
        .expect("candle series");

    for timestamp in [BASE_TS + 60, BASE_TS + 120 + 180] {
        harness.feed.trade(Trade {
            price: 9.0,
            amount: 1.0,
            amount_usd: 9.0,
            timestamp,
        });
    }

    assert_eq!(*trades.borrow(), 2);
    assert!(harness.recorder.update_calls(price).is_empty());
    assert_eq!(widget.chart_data().candles, three_candles());
}

#[test]
fn small_growth_upserts_last_candle_and_scrolls() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let _widget = harness.create(options().with_token("1-0xabc").with_volume(true));
    let price = harness
        .recorder
        .series_of_kind(SeriesKind::Candlestick)
        .expect("candle series");

    let mut grown = three_candles();
    grown.push(Candle::new(BASE_TS + 180, 1.25, 1.5, 1.2, 1.45).with_volume(50.0, 40.0));
    harness.feed.snapshot(grown.clone());

    assert_eq!(harness.recorder.set_data_calls(price).len(), 1);
    let updates = harness.recorder.update_calls(price);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].time(), BASE_TS + 180);
    assert_eq!(
        harness
            .recorder
            .count(|call| *call == ChartCall::ScrollToRealTime),
        1
    );

    // Same count again still counts as a live update.
    harness.feed.snapshot(grown);
    assert_eq!(harness.recorder.update_calls(price).len(), 2);
}

#[test]
fn large_growth_or_shrink_replaces_everything() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let _widget = harness.create(options().with_token("1-0xabc"));
    let price = harness
        .recorder
        .series_of_kind(SeriesKind::Candlestick)
        .expect("candle series");

    let mut grown = three_candles();
    for minute in 3..6 {
        grown.push(Candle::new(BASE_TS + minute * 60, 1.0, 1.0, 1.0, 1.0));
    }
    harness.feed.snapshot(grown);
    harness.feed.snapshot(three_candles());

    assert_eq!(harness.recorder.set_data_calls(price).len(), 3);
    assert!(harness.recorder.update_calls(price).is_empty());
    assert_eq!(harness.recorder.count(|call| *call == ChartCall::FitContent), 3);
}

#[test]
fn display_shift_applies_to_series_times_only() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let widget = harness.create(
        options()
            .with_token("1-0xabc")
            .with_utc_offset_seconds(-18_000),
    );
    let price = harness
        .recorder
        .series_of_kind(SeriesKind::Candlestick)
        .expect("candle series");

    match &harness.recorder.set_data_calls(price)[0] {
        SeriesData::Candles(points) => {
            assert_eq!(points[0].time, BASE_TS - 18_000);
            assert_eq!(points[2].time, BASE_TS + 120 - 18_000);
        }
        other => panic!("expected candle data, got {other:?}"),
    }
    assert_eq!(widget.chart_data().candles[0].timestamp, BASE_TS);
}

#[test]
fn data_update_and_connection_callbacks_fire() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let updates = Rc::new(RefCell::new(Vec::new()));
    let connections = Rc::new(RefCell::new(Vec::new()));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let _widget = {
        let updates = Rc::clone(&updates);
        let connections = Rc::clone(&connections);
        let errors = Rc::clone(&errors);
        harness.create(
            options()
                .with_token("1-0xabc")
                .on_data_update(move |data| updates.borrow_mut().push(data.candles.len()))
                .on_connection_change(move |connected| connections.borrow_mut().push(connected))
                .on_error(move |message| errors.borrow_mut().push(message.to_owned())),
        )
    };

    let sink = harness.feed.sink();
    sink.connection_status(true);
    sink.error("socket closed");
    sink.connection_status(false);

    assert_eq!(*updates.borrow(), vec![3]);
    assert_eq!(*connections.borrow(), vec![true, false]);
    assert_eq!(*errors.borrow(), vec!["socket closed".to_owned()]);
    assert_eq!(
        harness.feed.calls()[..2],
        [
            FeedCall::ConnectWebsocket,
            FeedCall::Initialize {
                token_id: "1-0xabc".to_owned(),
                with_history: true,
            },
        ]
    );
}

#[test]
fn callbacks_may_call_back_into_the_widget() {
    let harness = Harness::new(ScriptedFeed::new().with_history(three_candles()));
    let widget: Rc<RefCell<Option<WidgetHandle>>> = Rc::new(RefCell::new(None));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handle = {
        let widget = Rc::clone(&widget);
        let seen = Rc::clone(&seen);
        harness.create(options().on_data_update(move |_| {
            if let Some(handle) = widget.borrow().as_ref() {
                seen.borrow_mut().push(handle.chart_data().candles.len());
                handle.set_show_volume(true);
            }
        }))
    };
    *widget.borrow_mut() = Some(handle);

    harness.feed.snapshot(three_candles());

    assert_eq!(*seen.borrow(), vec![3]);
    assert!(
        harness
            .recorder
            .series_of_kind(SeriesKind::Histogram)
            .is_some()
    );
    // Break the handle cycle so the widget is released.
    let handle = widget.borrow_mut().take();
    drop(handle);
}

#[test]
fn merged_trade_refreshes_last_update_marker() {
    let harness = Harness::new(ScriptedFeed::new());
    let widget = harness.create(options());
    harness.feed.sink().chart_update(ChartData {
        candles: three_candles(),
        ..ChartData::default()
    });
    assert!(widget.chart_data().last_update.is_none());

    harness.feed.trade(Trade {
        price: 1.30,
        amount: 1.0,
        amount_usd: 1.30,
        timestamp: BASE_TS + 170,
    });

    assert!(widget.chart_data().last_update.is_some());
}
