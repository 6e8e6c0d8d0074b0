//! Price data access port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Every bar for `ticker`, sorted by date.
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, BacktestError>;

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError>;

    /// First date, last date and bar count, or `None` when there are no bars.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        let bars = self.fetch_ohlcv(ticker)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
