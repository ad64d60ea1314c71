//! CLI integration tests: config files and CSV data on disk, commands
//! dispatched through `cli::run`.

mod common;

use common::*;
use sigtrader::cli::{self, Cli};
use sigtrader::domain::asset::Timeframe;
use sigtrader::domain::error::SigtraderError;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

use clap::Parser;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv(dir: &Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        writeln!(
            content,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
    fs::write(dir.join(format!("{}_{}.csv", symbol, Timeframe::D1)), content).unwrap();
}

fn ini_for(data_dir: &Path, strategy_id: &str) -> String {
    format!(
        "[backtest]\n\
         symbol = AAPL\n\
         strategy_id = {strategy_id}\n\
         start_date = 2024-01-01\n\
         end_date = 2024-12-31\n\
         timeframe = 1d\n\
         initial_capital = 10000\n\
         commission = 0.001\n\
         slippage = 0.0005\n\
         \n\
         [data]\n\
         dir = {}\n",
        data_dir.display()
    )
}

struct Fixture {
    _data: TempDir,
    ini: tempfile::NamedTempFile,
}

fn fixture(strategy_id: &str) -> Fixture {
    let data = TempDir::new().unwrap();
    write_csv(data.path(), "AAPL", &surge_bars("AAPL", 60));
    write_csv(data.path(), "TINY", &generate_bars("TINY", 12, 10.0));
    let ini = write_temp_ini(&ini_for(data.path(), strategy_id));
    Fixture { _data: data, ini }
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["sigtrader"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

mod config_parsing {
    use super::*;

    #[test]
    fn load_config_builds_request() {
        let fx = fixture("long_equity_momentum");
        let adapter = cli::load_config(fx.ini.path()).unwrap();
        let request = cli::build_backtest_request(&adapter, None, None).unwrap();

        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.strategy_id, "long_equity_momentum");
        assert_eq!(request.start_date, date(2024, 1, 1));
        assert_eq!(request.end_date, date(2024, 12, 31));
        assert_eq!(request.timeframe, Timeframe::D1);
        assert_eq!(request.config.initial_capital, 10_000.0);
        assert_eq!(request.config.execution.commission_rate, 0.001);
        assert_eq!(request.config.execution.slippage_rate, 0.0005);
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let ini = write_temp_ini(
            "[backtest]\nsymbol = AAPL\nstrategy_id = x\nstart_date = 2024-01-01\nend_date = 2024-12-31\ninitial_capital = -5\n[data]\ndir = d\n",
        );
        let err = cli::load_config(ini.path()).err().unwrap();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn load_config_missing_file_is_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/sigtrader.ini"))
            .err()
            .unwrap();
        assert!(matches!(err, SigtraderError::ConfigParse { .. }));
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_accepts_known_strategy() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(run(&["validate", "--config", path]), ExitCode::SUCCESS);
    }

    #[test]
    fn validate_rejects_unknown_strategy() {
        let fx = fixture("no_such_strategy");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(run(&["validate", "--config", path]), ExitCode::from(4));
    }

    #[test]
    fn validate_missing_file_exits_with_config_code() {
        assert_eq!(
            run(&["validate", "--config", "/nonexistent/sigtrader.ini"]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn backtest_runs_from_csv() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(run(&["backtest", "--config", path]), ExitCode::SUCCESS);
        assert_eq!(run(&["backtest", "--config", path, "--json"]), ExitCode::SUCCESS);
    }

    #[test]
    fn backtest_with_too_few_bars_exits_with_data_code() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(
            run(&["backtest", "--config", path, "--symbol", "TINY"]),
            ExitCode::from(5)
        );
    }

    #[test]
    fn batch_reports_first_failure() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(
            run(&[
                "batch",
                "--config",
                path,
                "--symbols",
                "AAPL",
                "--strategies",
                "long_equity_momentum,short_equity_reversal",
                "--jobs",
                "2",
            ]),
            ExitCode::SUCCESS
        );
        assert_eq!(
            run(&[
                "batch",
                "--config",
                path,
                "--symbols",
                "AAPL,ZZZZ",
                "--strategies",
                "long_equity_momentum",
                "--json",
            ]),
            ExitCode::from(4)
        );
    }

    #[test]
    fn indicators_need_fifty_bars() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(run(&["indicators", "--config", path]), ExitCode::SUCCESS);
        assert_eq!(
            run(&["indicators", "--config", path, "--symbol", "TINY"]),
            ExitCode::from(5)
        );
    }

    #[test]
    fn forecast_runs_with_seed() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(
            run(&["forecast", "--config", path, "--seed", "7"]),
            ExitCode::SUCCESS
        );
        assert_eq!(
            run(&[
                "forecast",
                "--config",
                path,
                "--strategies",
                "long_equity_momentum,short_equity_reversal",
                "--json",
            ]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn forecast_exit_codes() {
        let fx = fixture("long_equity_momentum");
        let path = fx.ini.path().to_str().unwrap();
        assert_eq!(
            run(&["forecast", "--config", path, "--strategies", "nope"]),
            ExitCode::from(4)
        );
        assert_eq!(
            run(&["forecast", "--config", path, "--symbol", "TINY"]),
            ExitCode::from(5)
        );
    }

    #[test]
    fn strategies_lists_catalog() {
        assert_eq!(run(&["strategies"]), ExitCode::SUCCESS);
        assert_eq!(
            run(&["strategies", "--symbol", "BTC-USD", "--json"]),
            ExitCode::SUCCESS
        );
    }
}
