//! Entry and exit signal evaluation.
//!
//! Both evaluators are pure: they read one bar's context and return a
//! `SignalDecision`. A missing indicator value never produces a signal.

use super::indicator::IndicatorSnapshot;
use super::ohlcv::OhlcvBar;
use super::position::{EntryReason, ExitReason, Position, Side};
use super::strategy::{Strategy, StrategyCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDecision {
    NoSignal,
    Entry { side: Side, reason: EntryReason },
    Exit { reason: ExitReason },
}

/// Thresholds for opening a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRules {
    pub long_rsi_above: f64,
    pub short_rsi_above: f64,
    pub volume_surge_ratio: f64,
}

impl Default for EntryRules {
    fn default() -> Self {
        EntryRules {
            long_rsi_above: 50.0,
            short_rsi_above: 70.0,
            volume_surge_ratio: 1.2,
        }
    }
}

/// Thresholds for closing a position, checked in field order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    pub max_holding_days: i64,
    pub profit_target_pct: f64,
    pub stop_loss_pct: f64,
    pub overbought_rsi: f64,
    pub oversold_rsi: f64,
}

impl Default for ExitRules {
    fn default() -> Self {
        ExitRules {
            max_holding_days: 30,
            profit_target_pct: 15.0,
            stop_loss_pct: 5.0,
            overbought_rsi: 80.0,
            oversold_rsi: 30.0,
        }
    }
}

/// What the evaluator may look at on bar `i`: the bar, its snapshot and
/// bar `i - 1` with its snapshot.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a OhlcvBar,
    pub indicators: &'a IndicatorSnapshot,
    pub previous: Option<(&'a OhlcvBar, &'a IndicatorSnapshot)>,
}

impl<'a> BarContext<'a> {
    /// Context for index `i` of aligned bar/snapshot slices.
    pub fn at(bars: &'a [OhlcvBar], snapshots: &'a [IndicatorSnapshot], i: usize) -> Self {
        let previous = i.checked_sub(1).map(|p| (&bars[p], &snapshots[p]));
        BarContext {
            bar: &bars[i],
            indicators: &snapshots[i],
            previous,
        }
    }
}

pub fn entry_signal(strategy: &Strategy, ctx: &BarContext<'_>, rules: &EntryRules) -> SignalDecision {
    match strategy.category {
        StrategyCategory::Long => long_entry(ctx, rules),
        StrategyCategory::Short => short_entry(ctx, rules),
        StrategyCategory::Spread
        | StrategyCategory::Straddle
        | StrategyCategory::Strangle
        | StrategyCategory::IronCondor => SignalDecision::NoSignal,
    }
}

fn long_entry(ctx: &BarContext<'_>, rules: &EntryRules) -> SignalDecision {
    let (Some(rsi), Some(sma20), Some(volume)) = (
        ctx.indicators.rsi,
        ctx.indicators.sma20,
        ctx.indicators.volume,
    ) else {
        return SignalDecision::NoSignal;
    };

    if rsi > rules.long_rsi_above
        && ctx.bar.close > sma20
        && volume.is_surge(rules.volume_surge_ratio)
    {
        SignalDecision::Entry {
            side: Side::Long,
            reason: EntryReason::BullishMomentum,
        }
    } else {
        SignalDecision::NoSignal
    }
}

fn short_entry(ctx: &BarContext<'_>, rules: &EntryRules) -> SignalDecision {
    let (Some(rsi), Some(sma20)) = (ctx.indicators.rsi, ctx.indicators.sma20) else {
        return SignalDecision::NoSignal;
    };
    let Some((prev_bar, prev_indicators)) = ctx.previous else {
        return SignalDecision::NoSignal;
    };
    let Some(prev_sma20) = prev_indicators.sma20 else {
        return SignalDecision::NoSignal;
    };

    let fresh_breakdown = prev_bar.close > prev_sma20;
    if rsi > rules.short_rsi_above && ctx.bar.close < sma20 && fresh_breakdown {
        SignalDecision::Entry {
            side: Side::Short,
            reason: EntryReason::BearishReversal,
        }
    } else {
        SignalDecision::NoSignal
    }
}

pub fn exit_signal(
    position: &Position,
    ctx: &BarContext<'_>,
    days_held: i64,
    rules: &ExitRules,
) -> SignalDecision {
    let exit = |reason| SignalDecision::Exit { reason };

    if days_held > rules.max_holding_days {
        return exit(ExitReason::MaxHoldingPeriod);
    }

    let close = ctx.bar.close;
    let entry = position.entry_price;
    let target = rules.profit_target_pct / 100.0;
    let stop = rules.stop_loss_pct / 100.0;

    match position.side {
        Side::Long => {
            if close >= entry * (1.0 + target) {
                return exit(ExitReason::ProfitTarget);
            }
            if close <= entry * (1.0 - stop) {
                return exit(ExitReason::StopLoss);
            }
            if ctx.indicators.rsi.is_some_and(|rsi| rsi > rules.overbought_rsi) {
                return exit(ExitReason::Overbought);
            }
        }
        Side::Short => {
            if close <= entry * (1.0 - target) {
                return exit(ExitReason::ProfitTarget);
            }
            if close >= entry * (1.0 + stop) {
                return exit(ExitReason::StopLoss);
            }
            if ctx.indicators.rsi.is_some_and(|rsi| rsi < rules.oversold_rsi) {
                return exit(ExitReason::Oversold);
            }
        }
    }

    SignalDecision::NoSignal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::volume::VolumeStats;
    use crate::domain::strategy::{AssetClass, RiskLevel};
    use chrono::NaiveDate;

    fn strategy(category: StrategyCategory) -> Strategy {
        Strategy {
            id: "test".into(),
            name: "Test".into(),
            asset_class: AssetClass::Equity,
            category,
            description: String::new(),
            risk_level: RiskLevel::Medium,
            capital_required: 1000.0,
            max_loss: None,
            max_profit: None,
            success_rate: None,
            avg_return: None,
        }
    }

    fn bar(close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
            vwap: None,
        }
    }

    fn snapshot(rsi: f64, sma20: f64, surge: bool) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma20: Some(sma20),
            sma50: Some(sma20),
            rsi: Some(rsi),
            volume: Some(VolumeStats {
                recent_mean: if surge { 2000.0 } else { 1000.0 },
                baseline_mean: 1000.0,
            }),
        }
    }

    fn long_position(entry_price: f64) -> Position {
        Position {
            side: Side::Long,
            quantity: 10.0,
            entry_price,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn short_position(entry_price: f64) -> Position {
        Position {
            side: Side::Short,
            ..long_position(entry_price)
        }
    }

    fn ctx<'a>(bar: &'a OhlcvBar, indicators: &'a IndicatorSnapshot) -> BarContext<'a> {
        BarContext {
            bar,
            indicators,
            previous: None,
        }
    }

    #[test]
    fn long_entry_fires_on_momentum_with_volume() {
        let b = bar(105.0);
        let s = snapshot(60.0, 100.0, true);
        let decision = entry_signal(&strategy(StrategyCategory::Long), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(
            decision,
            SignalDecision::Entry {
                side: Side::Long,
                reason: EntryReason::BullishMomentum
            }
        );
    }

    #[test]
    fn long_entry_needs_volume_surge() {
        let b = bar(105.0);
        let s = snapshot(60.0, 100.0, false);
        let decision = entry_signal(&strategy(StrategyCategory::Long), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn long_entry_needs_close_above_sma() {
        let b = bar(95.0);
        let s = snapshot(60.0, 100.0, true);
        let decision = entry_signal(&strategy(StrategyCategory::Long), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn long_entry_needs_rsi_strictly_above_50() {
        let b = bar(105.0);
        let s = snapshot(50.0, 100.0, true);
        let decision = entry_signal(&strategy(StrategyCategory::Long), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn missing_indicator_blocks_entry() {
        let b = bar(105.0);
        let mut s = snapshot(60.0, 100.0, true);
        s.rsi = None;
        let decision = entry_signal(&strategy(StrategyCategory::Long), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn short_entry_on_fresh_breakdown() {
        let prev_bar = bar(102.0);
        let prev_snap = snapshot(75.0, 100.0, false);
        let b = bar(98.0);
        let s = snapshot(75.0, 100.0, false);
        let context = BarContext {
            bar: &b,
            indicators: &s,
            previous: Some((&prev_bar, &prev_snap)),
        };
        let decision = entry_signal(&strategy(StrategyCategory::Short), &context, &EntryRules::default());
        assert_eq!(
            decision,
            SignalDecision::Entry {
                side: Side::Short,
                reason: EntryReason::BearishReversal
            }
        );
    }

    #[test]
    fn short_entry_requires_previous_close_above_sma() {
        let prev_bar = bar(99.0);
        let prev_snap = snapshot(75.0, 100.0, false);
        let b = bar(98.0);
        let s = snapshot(75.0, 100.0, false);
        let context = BarContext {
            bar: &b,
            indicators: &s,
            previous: Some((&prev_bar, &prev_snap)),
        };
        let decision = entry_signal(&strategy(StrategyCategory::Short), &context, &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn short_entry_without_previous_bar() {
        let b = bar(98.0);
        let s = snapshot(75.0, 100.0, false);
        let decision = entry_signal(&strategy(StrategyCategory::Short), &ctx(&b, &s), &EntryRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn neutral_categories_never_enter() {
        let b = bar(105.0);
        let s = snapshot(90.0, 100.0, true);
        for category in [
            StrategyCategory::Spread,
            StrategyCategory::Straddle,
            StrategyCategory::Strangle,
            StrategyCategory::IronCondor,
        ] {
            let decision = entry_signal(&strategy(category), &ctx(&b, &s), &EntryRules::default());
            assert_eq!(decision, SignalDecision::NoSignal, "{category} entered");
        }
    }

    #[test]
    fn time_stop_wins_over_everything() {
        let b = bar(200.0);
        let s = snapshot(90.0, 100.0, false);
        let decision = exit_signal(&long_position(100.0), &ctx(&b, &s), 31, &ExitRules::default());
        assert_eq!(
            decision,
            SignalDecision::Exit {
                reason: ExitReason::MaxHoldingPeriod
            }
        );
    }

    #[test]
    fn time_stop_is_strict() {
        let b = bar(100.0);
        let s = snapshot(50.0, 100.0, false);
        let decision = exit_signal(&long_position(100.0), &ctx(&b, &s), 30, &ExitRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn long_profit_target_before_overbought() {
        let b = bar(116.0);
        let s = snapshot(90.0, 100.0, false);
        let decision = exit_signal(&long_position(100.0), &ctx(&b, &s), 3, &ExitRules::default());
        assert_eq!(
            decision,
            SignalDecision::Exit {
                reason: ExitReason::ProfitTarget
            }
        );
    }

    #[test]
    fn long_stop_loss() {
        let b = bar(94.0);
        let s = snapshot(40.0, 100.0, false);
        let decision = exit_signal(&long_position(100.0), &ctx(&b, &s), 3, &ExitRules::default());
        assert_eq!(
            decision,
            SignalDecision::Exit {
                reason: ExitReason::StopLoss
            }
        );
    }

    #[test]
    fn long_overbought_exit() {
        let b = bar(101.0);
        let s = snapshot(85.0, 100.0, false);
        let decision = exit_signal(&long_position(100.0), &ctx(&b, &s), 3, &ExitRules::default());
        assert_eq!(
            decision,
            SignalDecision::Exit {
                reason: ExitReason::Overbought
            }
        );
    }

    #[test]
    fn short_profit_target_and_stop() {
        let rules = ExitRules::default();
        let s = snapshot(50.0, 100.0, false);

        let b = bar(84.0);
        assert_eq!(
            exit_signal(&short_position(100.0), &ctx(&b, &s), 3, &rules),
            SignalDecision::Exit {
                reason: ExitReason::ProfitTarget
            }
        );

        let b = bar(106.0);
        assert_eq!(
            exit_signal(&short_position(100.0), &ctx(&b, &s), 3, &rules),
            SignalDecision::Exit {
                reason: ExitReason::StopLoss
            }
        );
    }

    #[test]
    fn short_oversold_exit() {
        let b = bar(99.0);
        let s = snapshot(25.0, 100.0, false);
        let decision = exit_signal(&short_position(100.0), &ctx(&b, &s), 3, &ExitRules::default());
        assert_eq!(
            decision,
            SignalDecision::Exit {
                reason: ExitReason::Oversold
            }
        );
    }

    #[test]
    fn short_ignores_overbought() {
        let b = bar(101.0);
        let s = snapshot(95.0, 100.0, false);
        let decision = exit_signal(&short_position(100.0), &ctx(&b, &s), 3, &ExitRules::default());
        assert_eq!(decision, SignalDecision::NoSignal);
    }

    #[test]
    fn context_at_first_bar_has_no_previous() {
        let bars = vec![bar(1.0), bar(2.0)];
        let snaps = vec![IndicatorSnapshot::default(); 2];
        assert!(BarContext::at(&bars, &snaps, 0).previous.is_none());
        assert!(BarContext::at(&bars, &snaps, 1).previous.is_some());
    }
}
