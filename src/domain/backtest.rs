//! Backtest engine: the bar-by-bar trade simulator.
//!
//! The simulator is a two-state machine (flat / in position). Indicators are
//! precomputed once; evaluation starts at `WARMUP_BARS`, the longest
//! indicator window, whatever the strategy actually reads. On a flat bar
//! only entry is evaluated, on an in-position bar only exit, so a position
//! is never closed and reopened on the same bar. A position still open
//! after the last bar produces no trade.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SigtraderError;
use super::execution::{close_position, open_position, ExecutionConfig};
use super::indicator::rsi::RsiZeroLoss;
use super::indicator::{compute_snapshots, SMA_SLOW_PERIOD};
use super::metrics::{analyze, EquityCurve, PerformanceSummary, ProfitFactorPolicy};
use super::ohlcv::OhlcvBar;
use super::portfolio::Portfolio;
use super::position::Trade;
use super::signal::{entry_signal, exit_signal, BarContext, EntryRules, ExitRules, SignalDecision};
use super::strategy::Strategy;

/// Fewer bars than this is an error, not an empty result.
pub const MIN_BARS: usize = 30;
/// First bar index at which signals are evaluated.
pub const WARMUP_BARS: usize = SMA_SLOW_PERIOD;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    pub entry_rules: EntryRules,
    pub exit_rules: ExitRules,
    pub rsi_zero_loss: RsiZeroLoss,
    pub profit_factor: ProfitFactorPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            execution: ExecutionConfig::default(),
            entry_rules: EntryRules::default(),
            exit_rules: ExitRules::default(),
            rsi_zero_loss: RsiZeroLoss::default(),
            profit_factor: ProfitFactorPolicy::default(),
        }
    }
}

impl BacktestConfig {
    pub fn with_costs(initial_capital: f64, commission_rate: f64, slippage_rate: f64) -> Self {
        BacktestConfig {
            initial_capital,
            execution: ExecutionConfig {
                commission_rate,
                slippage_rate,
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: PerformanceSummary,
    pub equity_curve: EquityCurve,
}

pub fn simulate_backtest(
    bars: &[OhlcvBar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, SigtraderError> {
    if bars.len() < MIN_BARS {
        return Err(SigtraderError::InsufficientData {
            symbol: bars.first().map(|b| b.symbol.clone()).unwrap_or_default(),
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    validate_inputs(strategy, config)?;
    validate_bars(bars)?;

    let trades = simulate_trades(bars, strategy, config);
    let (summary, equity_curve) = analyze(&trades, config.initial_capital, config.profit_factor);

    debug!(
        strategy = %strategy.id,
        bars = bars.len(),
        trades = trades.len(),
        total_return_pct = summary.total_return_pct,
        "backtest simulated"
    );

    Ok(BacktestResult {
        trades,
        summary,
        equity_curve,
    })
}

fn validate_inputs(strategy: &Strategy, config: &BacktestConfig) -> Result<(), SigtraderError> {
    let invalid = |name: &str, reason: &str| SigtraderError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if !(config.initial_capital > 0.0) {
        return Err(invalid("initial_capital", "must be positive"));
    }
    if !(config.execution.commission_rate >= 0.0) {
        return Err(invalid("commission_rate", "must be non-negative"));
    }
    if !(config.execution.slippage_rate >= 0.0) {
        return Err(invalid("slippage_rate", "must be non-negative"));
    }
    if !(strategy.capital_required > 0.0) {
        return Err(invalid("capital_required", "must be positive"));
    }
    Ok(())
}

/// Dates must strictly increase and every close must be a positive number.
pub(crate) fn validate_bars(bars: &[OhlcvBar]) -> Result<(), SigtraderError> {
    if let Some(pair) = bars.windows(2).find(|pair| pair[1].date <= pair[0].date) {
        return Err(SigtraderError::InvalidParameter {
            name: "bars".into(),
            reason: format!(
                "dates must strictly increase ({} follows {})",
                pair[1].date, pair[0].date
            ),
        });
    }
    if let Some(bar) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
        return Err(SigtraderError::InvalidParameter {
            name: "bars".into(),
            reason: format!("close on {} must be a positive number, got {}", bar.date, bar.close),
        });
    }
    Ok(())
}

fn simulate_trades(bars: &[OhlcvBar], strategy: &Strategy, config: &BacktestConfig) -> Vec<Trade> {
    let snapshots = compute_snapshots(bars, config.rsi_zero_loss);
    let mut portfolio = Portfolio::new();

    for i in WARMUP_BARS..bars.len() {
        let ctx = BarContext::at(bars, &snapshots, i);
        let bar = ctx.bar;

        match portfolio.position() {
            None => {
                if let SignalDecision::Entry { side, reason } =
                    entry_signal(strategy, &ctx, &config.entry_rules)
                {
                    let position = open_position(
                        side,
                        bar.close,
                        bar.date,
                        strategy.capital_required,
                        &config.execution,
                    );
                    debug!(date = %bar.date, %side, %reason, price = position.entry_price, "entry");
                    portfolio.open(position);
                }
            }
            Some(position) => {
                let days_held = position.days_held(bar.date);
                if let SignalDecision::Exit { reason } =
                    exit_signal(position, &ctx, days_held, &config.exit_rules)
                {
                    let trade = close_position(position, bar.close, bar.date, reason, &config.execution);
                    debug!(date = %bar.date, %reason, pnl = trade.pnl, "exit");
                    portfolio.take_position();
                    portfolio.record_trade(trade);
                }
            }
        }
    }

    if let Some(open) = portfolio.position() {
        debug!(entry_date = %open.entry_date, "discarding position still open at end of data");
    }

    portfolio.into_trades()
}
