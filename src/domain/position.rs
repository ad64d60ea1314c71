//! Open positions and the closed-trade ledger entries they produce.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    #[serde(rename = "Bullish momentum signal")]
    BullishMomentum,
    #[serde(rename = "Bearish reversal signal")]
    BearishReversal,
}

impl fmt::Display for EntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryReason::BullishMomentum => write!(f, "Bullish momentum signal"),
            EntryReason::BearishReversal => write!(f, "Bearish reversal signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "Maximum holding period reached")]
    MaxHoldingPeriod,
    #[serde(rename = "Profit target reached")]
    ProfitTarget,
    #[serde(rename = "Stop loss triggered")]
    StopLoss,
    #[serde(rename = "Overbought exit signal")]
    Overbought,
    #[serde(rename = "Oversold exit signal")]
    Oversold,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::MaxHoldingPeriod => "Maximum holding period reached",
            ExitReason::ProfitTarget => "Profit target reached",
            ExitReason::StopLoss => "Stop loss triggered",
            ExitReason::Overbought => "Overbought exit signal",
            ExitReason::Oversold => "Oversold exit signal",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub quantity: f64,
    /// Slippage-adjusted fill price.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    /// Calendar days between entry and `date`.
    pub fn days_held(&self, date: NaiveDate) -> i64 {
        (date - self.entry_date).num_days()
    }

    /// Price move in the position's favour, before costs.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        match self.side {
            Side::Long => (exit_price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - exit_price) * self.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub commission: f64,
    pub slippage_cost: f64,
    pub side: Side,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_long_position() -> Position {
        Position {
            side: Side::Long,
            quantity: 100.0,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn sample_short_position() -> Position {
        Position {
            side: Side::Short,
            quantity: 100.0,
            entry_price: 100.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn gross_pnl_long() {
        let pos = sample_long_position();
        assert!((pos.gross_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.gross_pnl(45.0) - (-500.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn gross_pnl_short() {
        let pos = sample_short_position();
        assert!((pos.gross_pnl(90.0) - 1000.0).abs() < f64::EPSILON);
        assert!((pos.gross_pnl(110.0) - (-1000.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn days_held_counts_calendar_days() {
        let pos = sample_long_position();
        let later = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(pos.days_held(later), 31);
        assert_eq!(pos.days_held(pos.entry_date), 0);
    }

    #[test]
    fn reasons_display_messages() {
        assert_eq!(ExitReason::StopLoss.to_string(), "Stop loss triggered");
        assert_eq!(
            EntryReason::BullishMomentum.to_string(),
            "Bullish momentum signal"
        );
    }

    #[test]
    fn exit_reason_serializes_as_message() {
        let json = serde_json::to_string(&ExitReason::Overbought).unwrap();
        assert_eq!(json, "\"Overbought exit signal\"");
    }
}
