//! Fill simulation: slippage, sizing and commission.
//!
//! Slippage always works against the trader. Entries fill above the close
//! for both sides; exits fill below the close for longs and above it for
//! shorts. Rates are fractions (0.0005 = 5 bps), not percentages.

use chrono::NaiveDate;

use super::position::{ExitReason, Position, Side, Trade};

/// Cost parameters applied to every fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            slippage_rate: 0.0005,
        }
    }
}

/// Entry fill: close * (1 + slippage), regardless of side.
pub fn apply_slippage_entry(market_price: f64, slippage_rate: f64) -> f64 {
    market_price * (1.0 + slippage_rate)
}

/// Exit fill: close * (1 - slippage) for longs, close * (1 + slippage) for shorts.
pub fn apply_slippage_exit(market_price: f64, side: Side, slippage_rate: f64) -> f64 {
    match side {
        Side::Long => market_price * (1.0 - slippage_rate),
        Side::Short => market_price * (1.0 + slippage_rate),
    }
}

/// Round-trip commission on both fills.
pub fn calculate_commission(entry_price: f64, exit_price: f64, quantity: f64, rate: f64) -> f64 {
    (entry_price + exit_price) * quantity * rate
}

/// Open a position sized so that `capital` buys it at the slipped price.
pub fn open_position(
    side: Side,
    market_price: f64,
    date: NaiveDate,
    capital: f64,
    config: &ExecutionConfig,
) -> Position {
    let entry_price = apply_slippage_entry(market_price, config.slippage_rate);
    Position {
        side,
        quantity: capital / entry_price,
        entry_price,
        entry_date: date,
    }
}

/// Close `position` at `market_price`, producing the ledger entry.
///
/// pnl is the signed price move times quantity less the round-trip
/// commission. `slippage_cost` is informational; it is already reflected in
/// both fill prices.
pub fn close_position(
    position: &Position,
    market_price: f64,
    date: NaiveDate,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Trade {
    let exit_price = apply_slippage_exit(market_price, position.side, config.slippage_rate);
    let commission = calculate_commission(
        position.entry_price,
        exit_price,
        position.quantity,
        config.commission_rate,
    );
    let slippage_cost = (position.entry_price * config.slippage_rate
        + exit_price * config.slippage_rate)
        * position.quantity;

    Trade {
        entry_date: position.entry_date,
        exit_date: date,
        entry_price: position.entry_price,
        exit_price,
        quantity: position.quantity,
        pnl: position.gross_pnl(exit_price) - commission,
        commission,
        slippage_cost,
        side: position.side,
        exit_reason: reason,
    }
}
