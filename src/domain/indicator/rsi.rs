//! RSI (Relative Strength Index) over a simple rolling window.
//!
//! avg_gain / avg_loss are plain means of the positive / absolute negative
//! close-to-close changes over the last n changes (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! Warmup: the first n bars are invalid (n price changes are needed).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// What RSI reads when the window contains no losing change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZeroLoss {
    /// RSI = 100, including a flat window where gains are zero as well.
    #[default]
    Saturate,
    /// RSI is left undefined for that bar.
    Undefined,
}

impl FromStr for RsiZeroLoss {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "saturate" => Ok(RsiZeroLoss::Saturate),
            "undefined" => Ok(RsiZeroLoss::Undefined),
            other => Err(format!("unknown rsi_zero_loss policy '{other}'")),
        }
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize, zero_loss: RsiZeroLoss) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::invalid(IndicatorType::Rsi(period), bars);
    }

    // changes[k] is the move from bar k to bar k + 1
    let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: 0.0,
            });
            continue;
        }

        let window = &changes[i - period..i];
        let avg_gain = window.iter().filter(|c| **c > 0.0).sum::<f64>() / period as f64;
        let avg_loss = window.iter().filter(|c| **c < 0.0).map(|c| -c).sum::<f64>() / period as f64;

        let rsi = if avg_loss == 0.0 {
            match zero_loss {
                RsiZeroLoss::Saturate => Some(100.0),
                RsiZeroLoss::Undefined => None,
            }
        } else {
            Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: rsi.is_some(),
            value: rsi.unwrap_or(0.0),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
