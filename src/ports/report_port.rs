//! Report generation port trait.

use chrono::NaiveDate;

use crate::domain::error::BacktestError;
use crate::domain::returns::DailyReturns;

/// Everything a report needs from a finished run.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub strategy_name: &'a str,
    pub returns: &'a DailyReturns,
    pub benchmark: Option<(&'a str, &'a DailyReturns)>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub risk_free_rate: f64,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, input: &ReportInput<'_>, output_path: &str) -> Result<(), BacktestError>;
}
