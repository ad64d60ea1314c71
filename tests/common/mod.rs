#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::asset::{Asset, Timeframe};
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::strategy::{AssetClass, RiskLevel, Strategy, StrategyCategory};
use sigtrader::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MarketDataPort for MockDataPort {
    fn search_assets(&self, query: &str, limit: usize) -> Result<Vec<Asset>, SigtraderError> {
        let mut symbols: Vec<&String> = self
            .data
            .keys()
            .filter(|s| s.to_uppercase().contains(&query.to_uppercase()))
            .collect();
        symbols.sort();
        Ok(symbols
            .into_iter()
            .take(limit)
            .map(|s| Asset::from_symbol(s))
            .collect())
    }

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, SigtraderError> {
        let known = self.data.contains_key(symbol) || self.errors.contains_key(symbol);
        Ok(known.then(|| Asset::from_symbol(symbol)))
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: NaiveDate, close: f64, volume: u64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
        vwap: None,
    }
}

/// Consecutive daily bars starting 2024-01-01.
pub fn bars_from(symbol: &str, closes: &[f64], volumes: &[u64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (close, volume))| {
            make_bar(symbol, start + chrono::Duration::days(i as i64), *close, *volume)
        })
        .collect()
}

/// Strictly rising closes (+1 per bar) at constant volume.
pub fn generate_bars(symbol: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from(symbol, &closes, &vec![1000; count])
}

/// Rising closes with volume stepping up tenfold from bar 50 on.
pub fn surge_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| 100.0 + i as f64).collect();
    let volumes: Vec<u64> = (0..count).map(|i| if i >= 50 { 10_000 } else { 1000 }).collect();
    bars_from(symbol, &closes, &volumes)
}

/// Deterministic oscillating series that produces a mix of trades.
pub fn wave_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.15).sin() * 12.0 + (t * 0.045).cos() * 6.0 + t * 0.05
        })
        .collect();
    let volumes: Vec<u64> = (0..count)
        .map(|i| 1000 + ((i * 37) % 11) as u64 * 250 + if i % 13 == 0 { 4000 } else { 0 })
        .collect();
    bars_from(symbol, &closes, &volumes)
}

pub fn make_strategy(id: &str, category: StrategyCategory) -> Strategy {
    Strategy {
        id: id.to_string(),
        name: id.to_string(),
        asset_class: AssetClass::Equity,
        category,
        description: "Test strategy".into(),
        risk_level: RiskLevel::Medium,
        capital_required: 1000.0,
        max_loss: None,
        max_profit: None,
        success_rate: None,
        avg_return: None,
    }
}

pub fn no_cost_config() -> BacktestConfig {
    BacktestConfig::with_costs(10_000.0, 0.0, 0.0)
}
