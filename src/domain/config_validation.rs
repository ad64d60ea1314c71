//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Optional keys fall
//! back to the request defaults; present keys must parse.

use crate::domain::asset::Timeframe;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::rsi::RsiZeroLoss;
use crate::domain::metrics::ProfitFactorPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_required(config, "backtest", "symbol")?;
    validate_required(config, "backtest", "strategy_id")?;
    validate_initial_capital(config)?;
    validate_rate(config, "commission")?;
    validate_rate(config, "slippage")?;
    validate_dates(config)?;
    validate_timeframe(config)?;
    validate_required(config, "data", "dir")?;
    validate_policies(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if value <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", key, 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("backtest", key, format!("{key} must be a fraction in [0, 1)")));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid("backtest", "start_date", "start_date must be before end_date"));
    }
    Ok(())
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid("backtest", field, format!("invalid {field} format, expected YYYY-MM-DD"))
        }),
    }
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(tf) = config.get_string("backtest", "timeframe") {
        tf.parse::<Timeframe>()
            .map_err(|reason| invalid("backtest", "timeframe", reason))?;
    }
    Ok(())
}

fn validate_policies(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(value) = config.get_string("policy", "rsi_zero_loss") {
        value
            .parse::<RsiZeroLoss>()
            .map_err(|reason| invalid("policy", "rsi_zero_loss", reason))?;
    }
    if let Some(value) = config.get_string("policy", "profit_factor") {
        value
            .parse::<ProfitFactorPolicy>()
            .map_err(|reason| invalid("policy", "profit_factor", reason))?;
    }
    Ok(())
}
