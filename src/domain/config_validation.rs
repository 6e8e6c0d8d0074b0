//! Configuration validation.
//!
//! Checks every `[backtest]`, `[strategy]` and `[report]` field before a
//! run is assembled, so bad input fails fast with the offending key.

use crate::domain::error::BacktestError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_NAMES: [&str; 3] = ["buy_and_hold", "sma_crossover", "equal_weight"];

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_dates(config)?;
    config.require_string("backtest", "benchmark")?;
    validate_tickers(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let name = config.require_string("strategy", "name")?;
    match name.as_str() {
        "buy_and_hold" => {
            config.require_string("strategy", "ticker")?;
        }
        "sma_crossover" => {
            config.require_string("strategy", "ticker")?;
            validate_sma_periods(config)?;
            validate_allocation(config)?;
        }
        "equal_weight" => validate_rebalance_days(config)?,
        other => {
            return Err(invalid(
                "strategy",
                "name",
                format!("unknown strategy {other:?}, expected one of {}", STRATEGY_NAMES.join(", ")),
            ));
        }
    }
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("report", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "report",
            "risk_free_rate",
            "risk_free_rate must be in [0, 1)",
        ));
    }
    Ok(())
}

/// Parses a required `YYYY-MM-DD` key from `[backtest]`.
pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, BacktestError> {
    let raw = config.require_string("backtest", key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| invalid("backtest", key, format!("invalid {key} format, expected YYYY-MM-DD")))
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date > end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(raw) = config.get_string("backtest", "tickers") {
        if raw.split(',').any(|t| t.trim().is_empty()) {
            return Err(invalid("backtest", "tickers", "empty ticker in list"));
        }
    }
    Ok(())
}

fn validate_sma_periods(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let fast = config.get_int("strategy", "fast", 0);
    if fast < 1 {
        return Err(invalid("strategy", "fast", "fast must be at least 1"));
    }
    let slow = config.get_int("strategy", "slow", 0);
    if slow <= fast {
        return Err(invalid("strategy", "slow", "slow must be greater than fast"));
    }
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("strategy", "allocation", 1.0);
    if value <= 0.0 || value > 1.0 || value.is_nan() {
        return Err(invalid(
            "strategy",
            "allocation",
            "allocation must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_rebalance_days(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_int("strategy", "rebalance_days", 20);
    if value < 1 {
        return Err(invalid(
            "strategy",
            "rebalance_days",
            "rebalance_days must be at least 1",
        ));
    }
    Ok(())
}
