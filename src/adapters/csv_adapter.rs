//! CSV file data adapter: one `<TICKER>.csv` per ticker in a directory.
//!
//! Expected header: `date,open,high,low,close,volume` with `YYYY-MM-DD` dates.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn parse_field<T>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    ticker: &str,
) -> Result<T, BacktestError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(idx)
        .ok_or_else(|| BacktestError::invalid_data(ticker, format!("missing {name} column")))?;
    raw.trim().parse().map_err(|e| {
        BacktestError::invalid_data(ticker, format!("invalid {name} value {raw:?}: {e}"))
    })
}

/// Volumes are sometimes exported as floats; whole values are truncated.
fn parse_volume(raw: f64, ticker: &str) -> Result<i64, BacktestError> {
    // i64::MAX as f64 rounds up to 2^63, so the bound is exclusive.
    if !raw.is_finite() || raw < 0.0 || raw >= i64::MAX as f64 {
        return Err(BacktestError::invalid_data(
            ticker,
            format!("volume {raw} out of range"),
        ));
    }
    Ok(raw.trunc() as i64)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            BacktestError::invalid_data(ticker, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| BacktestError::invalid_data(ticker, format!("CSV parse error: {e}")))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| BacktestError::invalid_data(ticker, "missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                BacktestError::invalid_data(ticker, format!("invalid date {date_str:?}: {e}"))
            })?;

            let volume = parse_volume(parse_field(&record, 5, "volume", ticker)?, ticker)?;

            bars.push(OhlcvBar {
                date,
                open: parse_field(&record, 1, "open", ticker)?,
                high: parse_field(&record, 2, "high", ticker)?,
                low: parse_field(&record, 3, "low", ticker)?,
                close: parse_field(&record, 4, "close", ticker)?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
