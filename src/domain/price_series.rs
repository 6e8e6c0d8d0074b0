//! Per-ticker price series with a date index.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Ordered daily bars for one ticker. Dates are strictly ascending.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    bars: Vec<OhlcvBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Builds the series, rejecting unsorted or duplicate dates.
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, BacktestError> {
        let ticker = ticker.into();
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BacktestError::invalid_data(
                    &ticker,
                    format!(
                        "dates must be strictly ascending ({} follows {})",
                        pair[1].date, pair[0].date
                    ),
                ));
            }
        }
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Ok(Self {
            ticker,
            bars,
            date_index,
        })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_index.contains_key(&date)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.index_of(date).map(|i| &self.bars[i])
    }

    pub fn close_at(&self, date: NaiveDate) -> Option<f64> {
        self.get_bar(date).map(|bar| bar.close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|bar| bar.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|bar| bar.date)
    }

    /// Closes of every bar dated on or before `date`, oldest first.
    pub fn closes_through(&self, date: NaiveDate) -> Vec<f64> {
        let end = self.bars.partition_point(|bar| bar.date <= date);
        self.bars[..end].iter().map(|bar| bar.close).collect()
    }

    /// Close-to-close return at `date` against the immediately preceding row.
    pub fn return_at(&self, date: NaiveDate) -> Result<f64, BacktestError> {
        let idx = self
            .index_of(date)
            .ok_or_else(|| BacktestError::lookup(&self.ticker, date, "no price for date"))?;
        if idx == 0 {
            return Err(BacktestError::lookup(
                &self.ticker,
                date,
                "no prior row to compute a return from",
            ));
        }
        let prev_close = self.bars[idx - 1].close;
        if prev_close <= 0.0 || !prev_close.is_finite() {
            return Err(BacktestError::domain(format!(
                "{} has non-positive close {} before {}",
                self.ticker, prev_close, date
            )));
        }
        Ok(self.bars[idx].close_return(prev_close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::new(
            "SPY",
            vec![
                make_bar("2024-01-02", 100.0),
                make_bar("2024-01-03", 110.0),
                make_bar("2024-01-05", 99.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_builds_date_index() {
        let series = sample_series();
        assert_eq!(series.len(), 3);
        assert_eq!(series.index_of(date("2024-01-02")), Some(0));
        assert_eq!(series.index_of(date("2024-01-05")), Some(2));
        assert_eq!(series.index_of(date("2024-01-04")), None);
    }

    #[test]
    fn new_rejects_unsorted_dates() {
        let result = PriceSeries::new(
            "SPY",
            vec![make_bar("2024-01-03", 100.0), make_bar("2024-01-02", 101.0)],
        );
        assert!(matches!(result, Err(BacktestError::InvalidData { .. })));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let result = PriceSeries::new(
            "SPY",
            vec![make_bar("2024-01-02", 100.0), make_bar("2024-01-02", 101.0)],
        );
        assert!(matches!(result, Err(BacktestError::InvalidData { .. })));
    }

    #[test]
    fn close_at_and_bounds() {
        let series = sample_series();
        assert_eq!(series.close_at(date("2024-01-03")), Some(110.0));
        assert_eq!(series.close_at(date("2024-01-04")), None);
        assert_eq!(series.first_date(), Some(date("2024-01-02")));
        assert_eq!(series.last_date(), Some(date("2024-01-05")));
    }

    #[test]
    fn closes_through_is_inclusive() {
        let series = sample_series();
        assert_eq!(series.closes_through(date("2024-01-03")), vec![100.0, 110.0]);
        assert_eq!(series.closes_through(date("2024-01-04")), vec![100.0, 110.0]);
        assert!(series.closes_through(date("2024-01-01")).is_empty());
    }

    #[test]
    fn return_at_uses_previous_row_not_calendar_day() {
        let series = sample_series();
        // 2024-01-05 follows 2024-01-03 positionally: (99 - 110) / 110
        let r = series.return_at(date("2024-01-05")).unwrap();
        assert!((r - (-11.0 / 110.0)).abs() < 1e-12);
    }

    #[test]
    fn return_at_first_row_is_lookup_error() {
        let series = sample_series();
        let err = series.return_at(date("2024-01-02")).unwrap_err();
        assert!(matches!(err, BacktestError::Lookup { .. }));
    }

    #[test]
    fn return_at_missing_date_is_lookup_error() {
        let series = sample_series();
        let err = series.return_at(date("2024-01-04")).unwrap_err();
        assert!(matches!(err, BacktestError::Lookup { ticker, .. } if ticker == "SPY"));
    }

    #[test]
    fn return_at_zero_prior_close_is_domain_error() {
        let series = PriceSeries::new(
            "ZERO",
            vec![make_bar("2024-01-02", 0.0), make_bar("2024-01-03", 5.0)],
        )
        .unwrap();
        let err = series.return_at(date("2024-01-03")).unwrap_err();
        assert!(matches!(err, BacktestError::Domain { .. }));
    }
}
