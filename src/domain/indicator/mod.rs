//! Technical indicator implementations.
//!
//! Each calculator returns an `IndicatorSeries` aligned index-for-index with
//! the input bars. A point is only `valid` once enough trailing history
//! exists; values at index `i` depend on bars `0..=i` only.
//!
//! `compute_snapshots` precomputes everything the signal evaluator needs in
//! one pass so the simulator never recalculates inside its bar loop.

pub mod rsi;
pub mod sma;
pub mod volume;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;
use rsi::{calculate_rsi, RsiZeroLoss};
use sma::calculate_sma;
use volume::{calculate_volume_stats, VolumeStats};

pub const SMA_FAST_PERIOD: usize = 20;
pub const SMA_SLOW_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const VOLUME_RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn invalid(indicator_type: IndicatorType, bars: &[OhlcvBar]) -> Self {
        IndicatorSeries {
            indicator_type,
            values: bars
                .iter()
                .map(|b| IndicatorPoint {
                    date: b.date,
                    valid: false,
                    value: 0.0,
                })
                .collect(),
        }
    }

    /// The value at `index`, or `None` during warmup or past the end.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

/// Indicator values available at a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IndicatorSnapshot {
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi: Option<f64>,
    #[serde(skip)]
    pub volume: Option<VolumeStats>,
}

pub fn compute_snapshots(bars: &[OhlcvBar], zero_loss: RsiZeroLoss) -> Vec<IndicatorSnapshot> {
    let sma20 = calculate_sma(bars, SMA_FAST_PERIOD);
    let sma50 = calculate_sma(bars, SMA_SLOW_PERIOD);
    let rsi = calculate_rsi(bars, RSI_PERIOD, zero_loss);
    let volume = calculate_volume_stats(bars, VOLUME_RECENT_WINDOW);

    (0..bars.len())
        .map(|i| IndicatorSnapshot {
            sma20: sma20.value_at(i),
            sma50: sma50.value_at(i),
            rsi: rsi.value_at(i),
            volume: volume[i],
        })
        .collect()
}
