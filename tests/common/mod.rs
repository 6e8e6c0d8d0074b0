#![allow(dead_code)]

use chrono::NaiveDate;
use fractrader::domain::backtest::BacktestConfig;
use fractrader::domain::error::BacktestError;
pub use fractrader::domain::ohlcv::OhlcvBar;
use fractrader::domain::price_series::PriceSeries;
use fractrader::ports::data_port::DataPort;
use std::collections::{BTreeMap, HashMap};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(BacktestError::InvalidData {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// One bar per consecutive calendar day starting at `start_date`.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn flat_bars(start_date: &str, count: usize, price: f64) -> Vec<OhlcvBar> {
    bars_from_closes(start_date, &vec![price; count])
}

pub fn make_series(ticker: &str, bars: Vec<OhlcvBar>) -> PriceSeries {
    PriceSeries::new(ticker, bars).unwrap()
}

pub fn data_map(series: Vec<PriceSeries>) -> BTreeMap<String, PriceSeries> {
    series.into_iter().map(|s| (s.ticker.clone(), s)).collect()
}

pub fn sample_config(start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig {
        start_date: start,
        end_date: end,
        benchmark: "SPY".into(),
    }
}

/// Writes `<TICKER>.csv` files in the layout `CsvAdapter` reads.
pub fn write_csv(dir: &std::path::Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}
