//! Date-indexed daily returns series.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub value: f64,
}

/// Append-only series of daily returns with strictly ascending dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReturns {
    points: Vec<ReturnPoint>,
}

impl DailyReturns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, value: f64) -> Result<(), BacktestError> {
        if let Some(last) = self.points.last() {
            if date <= last.date {
                return Err(BacktestError::domain(format!(
                    "return for {date} recorded after {}",
                    last.date
                )));
            }
        }
        self.points.push(ReturnPoint { date, value });
        Ok(())
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
    }
}
