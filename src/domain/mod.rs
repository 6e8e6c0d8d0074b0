//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod ledger;
pub mod returns;
pub mod backtest;
pub mod strategy;
pub mod metrics;
pub mod config_validation;
pub mod error;
