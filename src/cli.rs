//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::static_catalog::StaticCatalog;
use crate::domain::asset::Timeframe;
use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{parse_date, validate_backtest_config};
use crate::domain::error::{ReferenceKind, SigtraderError};
use crate::domain::execution::ExecutionConfig;
use crate::domain::forecast::Forecast;
use crate::domain::strategy::{AssetClass, RiskLevel, StrategyCategory};
use crate::ports::catalog_port::{StrategyCatalog, StrategyFilter};
use crate::ports::config_port::ConfigPort;
use crate::service::{
    BacktestReport, BacktestRequest, BacktestService, ForecastRequest, TechnicalSnapshot,
};

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Indicator-driven strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [backtest] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override [backtest] strategy_id
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Run every symbol/strategy combination in parallel
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols
        #[arg(long)]
        symbols: String,
        /// Comma-separated strategy ids
        #[arg(long)]
        strategies: String,
        /// Worker threads (defaults to available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// List catalog strategies
    Strategies {
        #[arg(long)]
        asset_class: Option<AssetClass>,
        #[arg(long)]
        risk: Option<RiskLevel>,
        #[arg(long)]
        category: Option<StrategyCategory>,
        /// Only strategies compatible with this symbol
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the latest indicator readings for a symbol
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Forecast strategies against a symbol's most recent bars
    Forecast {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Comma-separated strategy ids (defaults to [backtest] strategy_id)
        #[arg(long)]
        strategies: Option<String>,
        /// Seed for reproducible confidence scores
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            json,
        } => run_backtest(&config, symbol.as_deref(), strategy.as_deref(), json),
        Command::Batch {
            config,
            symbols,
            strategies,
            jobs,
            json,
        } => run_batch(&config, &symbols, &strategies, jobs, json),
        Command::Strategies {
            asset_class,
            risk,
            category,
            symbol,
            json,
        } => {
            let filter = StrategyFilter {
                asset_class,
                risk_level: risk,
                category,
            };
            run_strategies(&filter, symbol.as_deref(), json)
        }
        Command::Indicators {
            config,
            symbol,
            json,
        } => run_indicators(&config, symbol.as_deref(), json),
        Command::Forecast {
            config,
            symbol,
            strategies,
            seed,
            json,
        } => run_forecast(&config, symbol.as_deref(), strategies.as_deref(), seed, json),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate a backtest config file.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::load(path)?;
    validate_backtest_config(&adapter)?;
    Ok(adapter)
}

fn parse_policy<T>(adapter: &dyn ConfigPort, key: &str) -> Result<T, SigtraderError>
where
    T: std::str::FromStr<Err = String> + Default,
{
    match adapter.get_string("policy", key) {
        None => Ok(T::default()),
        Some(value) => value.parse().map_err(|reason| SigtraderError::ConfigInvalid {
            section: "policy".into(),
            key: key.into(),
            reason,
        }),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        execution: ExecutionConfig {
            commission_rate: adapter.get_double(
                "backtest",
                "commission",
                defaults.execution.commission_rate,
            ),
            slippage_rate: adapter.get_double(
                "backtest",
                "slippage",
                defaults.execution.slippage_rate,
            ),
        },
        rsi_zero_loss: parse_policy(adapter, "rsi_zero_loss")?,
        profit_factor: parse_policy(adapter, "profit_factor")?,
        ..defaults
    })
}

pub fn build_backtest_request(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
    strategy_override: Option<&str>,
) -> Result<BacktestRequest, SigtraderError> {
    let required = |key: &str| {
        adapter
            .get_string("backtest", key)
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
    };

    let symbol = match symbol_override {
        Some(s) => s.to_string(),
        None => required("symbol")?,
    };
    let strategy_id = match strategy_override {
        Some(s) => s.to_string(),
        None => required("strategy_id")?,
    };
    let timeframe = match adapter.get_string("backtest", "timeframe") {
        None => Timeframe::D1,
        Some(tf) => tf.parse().map_err(|reason| SigtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "timeframe".into(),
            reason,
        })?,
    };

    Ok(BacktestRequest {
        symbol,
        strategy_id,
        start_date: parse_date(adapter.get_string("backtest", "start_date").as_deref(), "start_date")?,
        end_date: parse_date(adapter.get_string("backtest", "end_date").as_deref(), "end_date")?,
        timeframe,
        config: build_backtest_config(adapter)?,
    })
}

pub fn data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, SigtraderError> {
    let dir = adapter
        .get_string("data", "dir")
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir)))
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, SigtraderError> {
    serde_json::to_string_pretty(value).map_err(|e| SigtraderError::Data {
        reason: format!("failed to serialize output: {e}"),
    })
}

fn run_backtest(
    config_path: &Path,
    symbol: Option<&str>,
    strategy: Option<&str>,
    json: bool,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let request = build_backtest_request(&adapter, symbol, strategy)?;
    let data = data_adapter(&adapter)?;
    let catalog = StaticCatalog::builtin();
    let service = BacktestService::new(&data, &catalog);

    info!(symbol = %request.symbol, strategy = %request.strategy_id, "running backtest");
    let report = service.run(&request)?;

    if json {
        println!("{}", to_json(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    symbol: &'a str,
    strategy_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a BacktestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_batch(
    config_path: &Path,
    symbols: &str,
    strategies: &str,
    jobs: Option<usize>,
    json: bool,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let symbols = parse_list(symbols);
    let strategies = parse_list(strategies);
    if symbols.is_empty() || strategies.is_empty() {
        return Err(SigtraderError::InvalidParameter {
            name: "batch".into(),
            reason: "at least one symbol and one strategy are required".into(),
        });
    }

    let base = build_backtest_request(&adapter, None, None)?;
    let requests: Vec<BacktestRequest> = symbols
        .iter()
        .flat_map(|symbol| {
            let base = &base;
            strategies.iter().map(move |strategy_id| BacktestRequest {
                symbol: symbol.clone(),
                strategy_id: strategy_id.clone(),
                ..base.clone()
            })
        })
        .collect();

    let jobs = jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let data = data_adapter(&adapter)?;
    let catalog = StaticCatalog::builtin();
    let service = BacktestService::new(&data, &catalog);

    info!(runs = requests.len(), jobs, "running batch");
    let results = service.run_batch(&requests, jobs);

    if json {
        let entries: Vec<BatchEntry<'_>> = requests
            .iter()
            .zip(&results)
            .map(|(req, result)| BatchEntry {
                symbol: &req.symbol,
                strategy_id: &req.strategy_id,
                report: result.as_ref().ok(),
                error: result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        println!("{}", to_json(&entries)?);
    } else {
        println!(
            "{:<12} {:<26} {:>7} {:>10} {:>8} {:>8}",
            "SYMBOL", "STRATEGY", "TRADES", "RETURN%", "WIN%", "SHARPE"
        );
        for (req, result) in requests.iter().zip(&results) {
            match result {
                Ok(report) => {
                    let s = &report.result.summary;
                    println!(
                        "{:<12} {:<26} {:>7} {:>10.2} {:>8.2} {:>8.2}",
                        req.symbol,
                        req.strategy_id,
                        s.trade_count,
                        s.total_return_pct,
                        s.win_rate_pct,
                        s.sharpe_ratio
                    );
                }
                Err(e) => println!("{:<12} {:<26} error: {e}", req.symbol, req.strategy_id),
            }
        }
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        eprintln!("{failed} of {} runs failed", results.len());
    }
    // first failure decides the exit code
    match results.into_iter().find_map(Result::err) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_strategies(
    filter: &StrategyFilter,
    symbol: Option<&str>,
    json: bool,
) -> Result<(), SigtraderError> {
    let catalog = StaticCatalog::builtin();
    let strategies: Vec<_> = match symbol {
        Some(symbol) => catalog
            .compatible(symbol)
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect(),
        None => catalog.list(filter),
    };

    if json {
        println!("{}", to_json(&strategies)?);
        return Ok(());
    }

    if strategies.is_empty() {
        eprintln!("No strategies match");
        return Ok(());
    }
    for s in &strategies {
        println!(
            "{:<26} {:<8} {:<12} {:<7} {:>9.0}  {}",
            s.id,
            s.asset_class.to_string(),
            s.category.to_string(),
            s.risk_level.to_string(),
            s.capital_required,
            s.name
        );
    }
    eprintln!("{} strategies", strategies.len());
    Ok(())
}

fn run_indicators(config_path: &Path, symbol: Option<&str>, json: bool) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let request = build_backtest_request(&adapter, symbol, None)?;
    let data = data_adapter(&adapter)?;
    let catalog = StaticCatalog::builtin();
    let service =
        BacktestService::new(&data, &catalog).with_rsi_zero_loss(request.config.rsi_zero_loss);

    let snapshot = service.latest_indicators(
        &request.symbol,
        request.timeframe,
        request.start_date,
        request.end_date,
    )?;

    if json {
        println!("{}", to_json(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn run_forecast(
    config_path: &Path,
    symbol: Option<&str>,
    strategies: Option<&str>,
    seed: Option<u64>,
    json: bool,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let base = build_backtest_request(&adapter, symbol, None)?;
    let strategy_ids = match strategies {
        Some(list) => parse_list(list),
        None => vec![base.strategy_id.clone()],
    };
    if strategy_ids.is_empty() {
        return Err(SigtraderError::InvalidParameter {
            name: "strategies".into(),
            reason: "at least one strategy is required".into(),
        });
    }

    let catalog = StaticCatalog::builtin();
    if let Some(unknown) = strategy_ids.iter().find(|id| catalog.get(id).is_none()) {
        return Err(SigtraderError::MissingReference {
            kind: ReferenceKind::Strategy,
            id: unknown.clone(),
        });
    }

    let data = data_adapter(&adapter)?;
    let service =
        BacktestService::new(&data, &catalog).with_rsi_zero_loss(base.config.rsi_zero_loss);
    let request = ForecastRequest {
        symbol: base.symbol,
        timeframe: base.timeframe,
        start_date: base.start_date,
        end_date: base.end_date,
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(symbol = %request.symbol, strategies = strategy_ids.len(), seed = ?seed, "running forecast");
    let forecasts = service.batch_forecast(&request, &strategy_ids, &mut rng)?;

    if json {
        println!("{}", to_json(&forecasts)?);
    } else {
        for forecast in &forecasts {
            print_forecast(forecast);
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let request = build_backtest_request(&adapter, None, None)?;

    let catalog = StaticCatalog::builtin();
    if catalog.get(&request.strategy_id).is_none() {
        return Err(SigtraderError::MissingReference {
            kind: ReferenceKind::Strategy,
            id: request.strategy_id,
        });
    }

    println!(
        "Configuration is valid: {} with {} from {} to {}",
        request.symbol, request.strategy_id, request.start_date, request.end_date
    );
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn print_snapshot(snapshot: &TechnicalSnapshot) {
    println!("{} as of {}", snapshot.symbol, snapshot.date);
    println!("  SMA(20): {}", fmt_opt(snapshot.sma20));
    println!("  SMA(50): {}", fmt_opt(snapshot.sma50));
    println!("  RSI(14): {}", fmt_opt(snapshot.rsi));
    println!("  VWAP:    {}", fmt_opt(snapshot.vwap));
}

fn fmt_prices(prices: &[f64]) -> String {
    if prices.is_empty() {
        return "none".to_string();
    }
    prices
        .iter()
        .map(|p| format!("{p:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_forecast(forecast: &Forecast) {
    println!(
        "{} / {} as of {} ({})",
        forecast.symbol,
        forecast.strategy.id,
        forecast.as_of,
        if forecast.is_valid { "valid setup" } else { "no setup" }
    );
    println!("  Current price:   {:.2}", forecast.current_price);
    println!("  Confidence:      {:.1}%", forecast.confidence);
    println!("  Win probability: {:.1}%", forecast.win_probability);
    println!("  Expected return: {:.2}", forecast.expected_return);
    println!("  Reward/risk:     {:.2}", forecast.reward_risk_ratio);
    println!("  Entries:         {}", fmt_prices(&forecast.entry_points));
    println!("  Exits:           {}", fmt_prices(&forecast.exit_points));
    println!("  {}", forecast.reasoning);
    println!();
}

fn print_report(report: &BacktestReport) {
    let s = &report.result.summary;
    println!(
        "{} / {} ({} to {})",
        report.asset.symbol, report.strategy.name, report.period.start, report.period.end
    );
    println!("  Initial capital: {:.2}", report.initial_capital);
    println!("  Trades:          {}", s.trade_count);
    println!("  Total return:    {:.2}%", s.total_return_pct);
    println!("  Win rate:        {:.2}%", s.win_rate_pct);
    println!("  Sharpe ratio:    {:.2}", s.sharpe_ratio);
    println!("  Max drawdown:    {:.2}%", s.max_drawdown_pct);
    println!("  Avg win:         {:.2}", s.avg_win);
    println!("  Avg loss:        {:.2}", s.avg_loss);
    println!("  Profit factor:   {:.2}", s.profit_factor);

    if !report.result.trades.is_empty() {
        println!();
        println!(
            "  {:<10} {:<10} {:<5} {:>10} {:>10} {:>10}  EXIT",
            "ENTRY", "EXIT", "SIDE", "ENTRY PX", "EXIT PX", "PNL"
        );
        for t in &report.result.trades {
            println!(
                "  {:<10} {:<10} {:<5} {:>10.2} {:>10.2} {:>10.2}  {}",
                t.entry_date.to_string(),
                t.exit_date.to_string(),
                t.side.to_string(),
                t.entry_price,
                t.exit_price,
                t.pnl,
                t.exit_reason
            );
        }
    }
}
