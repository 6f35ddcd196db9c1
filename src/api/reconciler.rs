use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{Candle, Trade};

/// Tuning knobs for snapshot and trade reconciliation.
///
/// Defaults preserve the widget's long-standing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Largest candle-count growth still considered incremental.
    pub incremental_threshold: usize,
    /// Forward window, in seconds, in which a trade may amend the last candle.
    pub trade_merge_window_secs: i64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            incremental_threshold: 50,
            trade_merge_window_secs: 120,
        }
    }
}

/// How a snapshot must reach the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotPlan {
    /// Recompute every series and fit content.
    FullReplace,
    /// Upsert the last candle and scroll to real time.
    LiveUpdate,
}

/// Decides between full replace and incremental upsert per delivery.
///
/// Assumes each snapshot is chronological and append-only relative to the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReconciler {
    config: ReconcileConfig,
    previous_count: usize,
    first_delivery: bool,
}

impl Default for UpdateReconciler {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}

impl UpdateReconciler {
    #[must_use]
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            previous_count: 0,
            first_delivery: true,
        }
    }

    #[must_use]
    pub fn previous_count(&self) -> usize {
        self.previous_count
    }

    #[must_use]
    pub fn is_first_delivery(&self) -> bool {
        self.first_delivery
    }

    /// Treats the next snapshot as the first one after (re)subscription.
    pub fn reset(&mut self) {
        self.previous_count = 0;
        self.first_delivery = true;
    }

    /// Plans a snapshot of `count` candles and records it as the new baseline.
    pub fn plan_snapshot(&mut self, count: usize) -> SnapshotPlan {
        let previous = self.previous_count;
        let plan = if self.first_delivery
            || count < previous
            || count - previous > self.config.incremental_threshold
        {
            SnapshotPlan::FullReplace
        } else if count - previous <= 1 {
            SnapshotPlan::LiveUpdate
        } else {
            // Several new candles under the threshold: one replace is cheaper
            // than upserting them one by one.
            SnapshotPlan::FullReplace
        };
        debug!(
            previous,
            count,
            first_delivery = self.first_delivery,
            threshold = self.config.incremental_threshold,
            ?plan,
            "planned snapshot"
        );
        self.previous_count = count;
        self.first_delivery = false;
        plan
    }

    /// Folds `trade` into the last candle when its minute bucket lies within
    /// `[0, trade_merge_window_secs]` after that candle's timestamp.
    ///
    /// Returns the amended candle, or `None` when the trade is outside the
    /// window and `candles` is left untouched.
    pub fn merge_trade(&self, candles: &mut [Candle], trade: &Trade) -> Option<Candle> {
        let last = candles.last_mut()?;
        let offset = trade
            .minute_bucket()
            .and_then(|bucket| bucket.checked_sub(last.timestamp));
        if !offset.is_some_and(|offset| (0..=self.config.trade_merge_window_secs).contains(&offset)) {
            trace!(
                ?offset,
                window = self.config.trade_merge_window_secs,
                "trade outside merge window"
            );
            return None;
        }
        last.absorb_trade(trade);
        Some(*last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64, close: f64) -> Candle {
        Candle::new(timestamp, close, close, close, close).with_volume(10.0, 1.0)
    }

    #[test]
    fn first_delivery_is_full_replace_even_without_growth() {
        let mut reconciler = UpdateReconciler::default();
        assert_eq!(reconciler.plan_snapshot(0), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.plan_snapshot(0), SnapshotPlan::LiveUpdate);
    }

    #[test]
    fn graduated_policy_matches_growth() {
        let mut reconciler = UpdateReconciler::default();
        assert_eq!(reconciler.plan_snapshot(100), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.plan_snapshot(100), SnapshotPlan::LiveUpdate);
        assert_eq!(reconciler.plan_snapshot(101), SnapshotPlan::LiveUpdate);
        assert_eq!(reconciler.plan_snapshot(103), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.plan_snapshot(153), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.plan_snapshot(204), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.plan_snapshot(10), SnapshotPlan::FullReplace);
        assert_eq!(reconciler.previous_count(), 10);
    }

    #[test]
    fn zero_threshold_disables_live_updates() {
        let mut reconciler = UpdateReconciler::new(ReconcileConfig {
            incremental_threshold: 0,
            ..ReconcileConfig::default()
        });
        reconciler.plan_snapshot(3);
        assert_eq!(reconciler.plan_snapshot(3), SnapshotPlan::LiveUpdate);
        assert_eq!(reconciler.plan_snapshot(4), SnapshotPlan::FullReplace);
    }

    #[test]
    fn reset_forces_full_replace() {
        let mut reconciler = UpdateReconciler::default();
        reconciler.plan_snapshot(5);
        reconciler.reset();
        assert!(reconciler.is_first_delivery());
        assert_eq!(reconciler.plan_snapshot(6), SnapshotPlan::FullReplace);
    }

    #[test]
    fn trade_inside_window_amends_last_candle() {
        let reconciler = UpdateReconciler::default();
        let mut candles = vec![candle(0, 1.0), candle(60, 2.0)];
        let trade = Trade {
            price: 2.5,
            amount: 4.0,
            amount_usd: 10.0,
            timestamp: 179,
        };

        let merged = reconciler.merge_trade(&mut candles, &trade).expect("merged");
        assert_eq!(merged, candles[1]);
        assert_eq!(merged.close, 2.5);
        assert_eq!(merged.high, 2.5);
        assert_eq!(merged.low, 2.0);
        assert_eq!(merged.volume_in, 20.0);
        assert_eq!(merged.volume_out, 5.0);
        assert_eq!(merged.transactions, 1);
        assert_eq!(candles[0], candle(0, 1.0));
    }

    #[test]
    fn trade_outside_window_or_before_last_candle_is_ignored() {
        let reconciler = UpdateReconciler::default();
        let mut candles = vec![candle(600, 2.0)];
        let before = candles.clone();

        for timestamp in [599, 540, 780, 1_000] {
            let trade = Trade {
                price: 9.0,
                amount: 1.0,
                amount_usd: 9.0,
                timestamp,
            };
            assert!(reconciler.merge_trade(&mut candles, &trade).is_none());
        }
        assert_eq!(candles, before);
    }

    #[test]
    fn extreme_timestamps_fall_outside_the_window() {
        let reconciler = UpdateReconciler::default();
        for (last_ts, trade_ts) in [(600, i64::MIN + 5), (i64::MIN + 60, i64::MAX), (i64::MAX - 7, i64::MIN)] {
            let mut candles = vec![candle(last_ts, 2.0)];
            let trade = Trade {
                price: 9.0,
                amount: 1.0,
                amount_usd: 9.0,
                timestamp: trade_ts,
            };
            assert!(reconciler.merge_trade(&mut candles, &trade).is_none());
            assert_eq!(candles, vec![candle(last_ts, 2.0)]);
        }
    }

    #[test]
    fn trade_on_empty_sequence_is_ignored() {
        let reconciler = UpdateReconciler::default();
        let trade = Trade {
            price: 1.0,
            amount: 1.0,
            amount_usd: 1.0,
            timestamp: 0,
        };
        assert!(reconciler.merge_trade(&mut [], &trade).is_none());
    }
}
