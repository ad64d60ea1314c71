//! Backtest orchestration over injected market data and strategy catalog ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::asset::{Asset, Timeframe};
use crate::domain::backtest::{simulate_backtest, BacktestConfig, BacktestResult, MIN_BARS};
use crate::domain::error::{ReferenceKind, SigtraderError};
use crate::domain::forecast::{generate_forecast, rank_forecasts, Forecast, FORECAST_MIN_BARS};
use crate::domain::indicator::rsi::RsiZeroLoss;
use crate::domain::indicator::{compute_snapshots, SMA_SLOW_PERIOD};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::Strategy;
use crate::ports::catalog_port::StrategyCatalog;
use crate::ports::data_port::MarketDataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub symbol: String,
    pub strategy_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timeframe: Timeframe,
    pub config: BacktestConfig,
}

impl BacktestRequest {
    /// Daily bars with default capital and costs.
    pub fn new(symbol: &str, strategy_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestRequest {
            symbol: symbol.to_string(),
            strategy_id: strategy_id.to_string(),
            start_date,
            end_date,
            timeframe: Timeframe::D1,
            config: BacktestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub strategy: Strategy,
    pub asset: Asset,
    pub period: BacktestPeriod,
    pub initial_capital: f64,
    #[serde(flatten)]
    pub result: BacktestResult,
}

/// Price window a forecast is computed over.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Latest indicator readings for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi: Option<f64>,
    /// Volume-weighted typical price over the whole fetched window.
    pub vwap: Option<f64>,
}

pub struct BacktestService<'a> {
    market: &'a dyn MarketDataPort,
    catalog: &'a dyn StrategyCatalog,
    rsi_zero_loss: RsiZeroLoss,
}

impl<'a> BacktestService<'a> {
    pub fn new(market: &'a dyn MarketDataPort, catalog: &'a dyn StrategyCatalog) -> Self {
        Self {
            market,
            catalog,
            rsi_zero_loss: RsiZeroLoss::default(),
        }
    }

    /// RSI policy for indicator snapshots and forecasts; backtests use the
    /// request's config.
    pub fn with_rsi_zero_loss(mut self, policy: RsiZeroLoss) -> Self {
        self.rsi_zero_loss = policy;
        self
    }

    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestReport, SigtraderError> {
        let strategy = self.resolve_strategy(&request.strategy_id)?;
        let asset = self.resolve_asset(&request.symbol)?;

        let bars = self.market.fetch_ohlcv(
            &request.symbol,
            request.timeframe,
            request.start_date,
            request.end_date,
        )?;
        ensure_bars(&request.symbol, &bars, MIN_BARS)?;

        let result = simulate_backtest(&bars, &strategy, &request.config)?;
        info!(
            symbol = %request.symbol,
            strategy = %strategy.id,
            trades = result.trades.len(),
            total_return_pct = result.summary.total_return_pct,
            "backtest complete"
        );

        Ok(BacktestReport {
            strategy,
            asset,
            period: BacktestPeriod {
                start: request.start_date,
                end: request.end_date,
            },
            initial_capital: request.config.initial_capital,
            result,
        })
    }

    /// Run each request independently on up to `parallelism` worker threads.
    /// Results come back in request order.
    pub fn run_batch(
        &self,
        requests: &[BacktestRequest],
        parallelism: usize,
    ) -> Vec<Result<BacktestReport, SigtraderError>> {
        let worker_count = parallelism.max(1).min(requests.len());
        let next_index = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        debug!(requests = requests.len(), workers = worker_count, "starting batch");

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                let tx = tx.clone();
                let next_index = &next_index;
                scope.spawn(move || loop {
                    let idx = next_index.fetch_add(1, Ordering::Relaxed);
                    if idx >= requests.len() {
                        break;
                    }
                    if tx.send((idx, self.run(&requests[idx]))).is_err() {
                        break;
                    }
                });
            }
            drop(tx);
        });

        let mut slots: Vec<Option<Result<BacktestReport, SigtraderError>>> =
            (0..requests.len()).map(|_| None).collect();
        for (idx, result) in rx {
            if let Err(err) = &result {
                warn!(symbol = %requests[idx].symbol, strategy = %requests[idx].strategy_id, error = %err, "batch run failed");
            }
            slots[idx] = Some(result);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(SigtraderError::Data {
                        reason: "batch worker produced no result".into(),
                    })
                })
            })
            .collect()
    }

    /// Past backtest reports. Nothing is persisted, so this is always empty.
    pub fn history(&self, symbol: &str, limit: usize) -> Vec<BacktestReport> {
        debug!(symbol, limit, "backtest history requested; results are not persisted");
        Vec::new()
    }

    pub fn latest_indicators(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TechnicalSnapshot, SigtraderError> {
        let bars = self.market.fetch_ohlcv(symbol, timeframe, start_date, end_date)?;
        ensure_bars(symbol, &bars, SMA_SLOW_PERIOD)?;

        let snapshots = compute_snapshots(&bars, self.rsi_zero_loss);
        let (Some(last_bar), Some(last)) = (bars.last(), snapshots.last()) else {
            return Err(SigtraderError::InsufficientData {
                symbol: symbol.to_string(),
                bars: 0,
                minimum: SMA_SLOW_PERIOD,
            });
        };

        Ok(TechnicalSnapshot {
            symbol: symbol.to_string(),
            date: last_bar.date,
            sma20: last.sma20,
            sma50: last.sma50,
            rsi: last.rsi,
            vwap: volume_weighted_typical_price(&bars),
        })
    }

    /// Forecast one strategy against the request window.
    pub fn forecast<R: Rng>(
        &self,
        request: &ForecastRequest,
        strategy_id: &str,
        rng: &mut R,
    ) -> Result<Forecast, SigtraderError> {
        let strategy = self.resolve_strategy(strategy_id)?;
        let bars = self.forecast_bars(request)?;
        generate_forecast(&request.symbol, &strategy, &bars, self.rsi_zero_loss, rng)
    }

    /// Forecast several strategies over one fetch of the symbol's bars,
    /// ranked by confidence. Unknown strategy ids are skipped.
    pub fn batch_forecast<R: Rng>(
        &self,
        request: &ForecastRequest,
        strategy_ids: &[String],
        rng: &mut R,
    ) -> Result<Vec<Forecast>, SigtraderError> {
        let bars = self.forecast_bars(request)?;
        let mut forecasts = Vec::with_capacity(strategy_ids.len());

        for id in strategy_ids {
            let strategy = match self.resolve_strategy(id) {
                Ok(strategy) => strategy,
                Err(err) => {
                    warn!(symbol = %request.symbol, strategy = %id, error = %err, "skipping forecast");
                    continue;
                }
            };
            forecasts.push(generate_forecast(
                &request.symbol,
                &strategy,
                &bars,
                self.rsi_zero_loss,
                rng,
            )?);
        }

        rank_forecasts(&mut forecasts);
        info!(symbol = %request.symbol, forecasts = forecasts.len(), "forecasts generated");
        Ok(forecasts)
    }

    fn forecast_bars(&self, request: &ForecastRequest) -> Result<Vec<OhlcvBar>, SigtraderError> {
        self.resolve_asset(&request.symbol)?;
        let bars = self.market.fetch_ohlcv(
            &request.symbol,
            request.timeframe,
            request.start_date,
            request.end_date,
        )?;
        ensure_bars(&request.symbol, &bars, FORECAST_MIN_BARS)?;
        Ok(bars)
    }

    fn resolve_strategy(&self, id: &str) -> Result<Strategy, SigtraderError> {
        self.catalog
            .get(id)
            .ok_or_else(|| SigtraderError::MissingReference {
                kind: ReferenceKind::Strategy,
                id: id.to_string(),
            })
    }

    fn resolve_asset(&self, symbol: &str) -> Result<Asset, SigtraderError> {
        self.market
            .get_asset(symbol)?
            .ok_or_else(|| SigtraderError::MissingReference {
                kind: ReferenceKind::Asset,
                id: symbol.to_string(),
            })
    }
}

fn ensure_bars(symbol: &str, bars: &[OhlcvBar], minimum: usize) -> Result<(), SigtraderError> {
    if bars.len() < minimum {
        return Err(SigtraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }
    Ok(())
}

/// Σ(typical × volume) / Σ volume; `None` when no volume traded.
fn volume_weighted_typical_price(bars: &[OhlcvBar]) -> Option<f64> {
    let total_volume: f64 = bars.iter().map(|b| b.volume as f64).sum();
    if total_volume <= 0.0 {
        return None;
    }
    let weighted: f64 = bars
        .iter()
        .map(|b| b.typical_price() * b.volume as f64)
        .sum();
    Some(weighted / total_volume)
}
