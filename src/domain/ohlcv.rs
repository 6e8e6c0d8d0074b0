//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Simple return from `prev_close` to this bar's close.
    pub fn close_return(&self, prev_close: f64) -> f64 {
        (self.close - prev_close) / prev_close
    }
}
