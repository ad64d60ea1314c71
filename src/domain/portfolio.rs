//! Single-position book and closed-trade ledger for one backtest run.

use super::position::{Position, Trade};

/// Holds at most one open position; never pyramids or hedges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    position: Option<Position>,
    pub closed_trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Callers must only open while flat.
    pub fn open(&mut self, position: Position) {
        debug_assert!(self.position.is_none(), "position already open");
        self.position = Some(position);
    }

    /// Remove the open position, if any, without recording a trade.
    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.closed_trades.push(trade);
    }

    /// Ledger of closed trades; any still-open position is dropped.
    pub fn into_trades(self) -> Vec<Trade> {
        self.closed_trades
    }
}
