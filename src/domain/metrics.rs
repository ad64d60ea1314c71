//! Performance statistics and equity curve derived from a trade ledger.
//!
//! Sharpe here is trade-level: mean / population stdev of per-trade returns
//! (pnl / initial capital) scaled by sqrt(252). It is not the conventional
//! daily-returns Sharpe.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const GROSS_LOSS_FLOOR: f64 = 1.0;

/// How profit factor is reported when no trade lost money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitFactorPolicy {
    /// Gross loss is floored at 1.0, so profit factor equals gross profit.
    #[default]
    FloorGrossLoss,
    /// +infinity when there is profit and no loss, 0 when there is neither.
    Unbounded,
}

impl FromStr for ProfitFactorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "floor" | "floor_gross_loss" => Ok(ProfitFactorPolicy::FloorGrossLoss),
            "unbounded" => Ok(ProfitFactorPolicy::Unbounded),
            other => Err(format!("unknown profit_factor policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return_pct: f64,
    pub win_rate_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub avg_win: f64,
    /// Mean pnl of losing trades; negative.
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub trade_pnl: Option<f64>,
}

pub type EquityCurve = Vec<EquityPoint>;

impl PerformanceSummary {
    pub fn compute(trades: &[Trade], initial_capital: f64, policy: ProfitFactorPolicy) -> Self {
        if trades.is_empty() {
            return PerformanceSummary::default();
        }

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let n = trades.len() as f64;

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        for trade in trades {
            if trade.is_win() {
                wins += 1;
                gross_profit += trade.pnl;
            } else if trade.is_loss() {
                losses += 1;
                gross_loss += trade.pnl;
            }
        }

        let avg_win = if wins > 0 {
            gross_profit / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };

        PerformanceSummary {
            total_return_pct: total_pnl / initial_capital * 100.0,
            win_rate_pct: wins as f64 / n * 100.0,
            sharpe_ratio: compute_sharpe(trades, initial_capital),
            max_drawdown_pct: compute_drawdown(trades, initial_capital),
            avg_win,
            avg_loss,
            profit_factor: compute_profit_factor(gross_profit, gross_loss.abs(), losses, policy),
            trade_count: trades.len(),
        }
    }
}

fn compute_profit_factor(
    gross_profit: f64,
    gross_loss: f64,
    losses: usize,
    policy: ProfitFactorPolicy,
) -> f64 {
    if losses > 0 && gross_loss > 0.0 {
        return gross_profit / gross_loss;
    }
    match policy {
        ProfitFactorPolicy::FloorGrossLoss => gross_profit / GROSS_LOSS_FLOOR,
        ProfitFactorPolicy::Unbounded if gross_profit > 0.0 => f64::INFINITY,
        ProfitFactorPolicy::Unbounded => 0.0,
    }
}

fn compute_sharpe(trades: &[Trade], initial_capital: f64) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = trades.iter().map(|t| t.pnl / initial_capital).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Peak-to-current decline of cumulative pnl, as percent of initial capital.
/// The peak starts at zero pnl and only moves on new highs.
fn compute_drawdown(trades: &[Trade], initial_capital: f64) -> f64 {
    let mut running = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        running += trade.pnl;
        if running > peak {
            peak = running;
        }
        let dd = (peak - running) / initial_capital * 100.0;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

/// Seeded at the first entry with `initial_capital`, then one point per exit.
/// Empty when there are no trades.
pub fn equity_curve(trades: &[Trade], initial_capital: f64) -> EquityCurve {
    let Some(first) = trades.first() else {
        return Vec::new();
    };

    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(EquityPoint {
        date: first.entry_date,
        equity: initial_capital,
        trade_pnl: None,
    });

    let mut equity = initial_capital;
    for trade in trades {
        equity += trade.pnl;
        curve.push(EquityPoint {
            date: trade.exit_date,
            equity,
            trade_pnl: Some(trade.pnl),
        });
    }

    curve
}

pub fn analyze(
    trades: &[Trade],
    initial_capital: f64,
    policy: ProfitFactorPolicy,
) -> (PerformanceSummary, EquityCurve) {
    (
        PerformanceSummary::compute(trades, initial_capital, policy),
        equity_curve(trades, initial_capital),
    )
}
