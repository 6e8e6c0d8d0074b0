//! Writes the daily returns series as CSV for downstream analysis tools.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::error::BacktestError;
use crate::ports::report_port::{ReportInput, ReportPort};

#[derive(Debug, Serialize)]
struct ReturnRow {
    date: NaiveDate,
    #[serde(rename = "return")]
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    benchmark: Option<f64>,
}

pub struct CsvReturnsAdapter;

impl ReportPort for CsvReturnsAdapter {
    fn write(&self, input: &ReportInput<'_>, output_path: &str) -> Result<(), BacktestError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let csv_err = |e: csv::Error| BacktestError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

        // The header comes from the first serialized row, so an empty
        // series still gets one written explicitly.
        if input.returns.is_empty() {
            let mut header = vec!["date", "return"];
            if input.benchmark.is_some() {
                header.push("benchmark");
            }
            writer.write_record(&header).map_err(csv_err)?;
        }

        for point in input.returns.points() {
            let benchmark = match input.benchmark {
                Some((_, bench)) => Some(bench.get(point.date).unwrap_or(0.0)),
                None => None,
            };
            writer
                .serialize(ReturnRow {
                    date: point.date,
                    value: point.value,
                    benchmark,
                })
                .map_err(csv_err)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = input.returns.len(), "wrote returns CSV");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::returns::DailyReturns;
    use tempfile::tempdir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn input<'a>(
        returns: &'a DailyReturns,
        benchmark: Option<(&'a str, &'a DailyReturns)>,
    ) -> ReportInput<'a> {
        ReportInput {
            strategy_name: "test",
            returns,
            benchmark,
            start_date: date(2),
            end_date: date(3),
            risk_free_rate: 0.0,
        }
    }

    #[test]
    fn writes_date_and_return_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("returns.csv");
        let mut returns = DailyReturns::new();
        returns.record(date(2), 0.0).unwrap();
        returns.record(date(3), 0.1).unwrap();

        CsvReturnsAdapter
            .write(&input(&returns, None), path.to_str().unwrap())
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "date,return\n2024-01-02,0.0\n2024-01-03,0.1\n");
    }

    #[test]
    fn writes_benchmark_column_when_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("returns.csv");
        let mut returns = DailyReturns::new();
        returns.record(date(2), 0.05).unwrap();
        let mut bench = DailyReturns::new();
        bench.record(date(2), 0.01).unwrap();

        CsvReturnsAdapter
            .write(&input(&returns, Some(("SPY", &bench))), path.to_str().unwrap())
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "date,return,benchmark\n2024-01-02,0.05,0.01\n");
    }

    #[test]
    fn empty_series_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let returns = DailyReturns::new();

        CsvReturnsAdapter
            .write(&input(&returns, None), path.to_str().unwrap())
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "date,return\n");
    }
}
