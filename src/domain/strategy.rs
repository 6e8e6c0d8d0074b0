//! Strategy callback and built-in strategies.
//!
//! A strategy is invoked once per trading day, after that day's return has
//! been accrued, with the ledger and the close history through the day.
//! Ledger changes it makes are first reflected in the next day's return.

use super::backtest::PriceHistory;
use super::error::BacktestError;
use super::ledger::Ledger;

pub trait Strategy {
    fn on_day(&mut self, ledger: &mut Ledger, history: &PriceHistory) -> Result<(), BacktestError>;
}

impl<F> Strategy for F
where
    F: FnMut(&mut Ledger, &PriceHistory) -> Result<(), BacktestError>,
{
    fn on_day(&mut self, ledger: &mut Ledger, history: &PriceHistory) -> Result<(), BacktestError> {
        self(ledger, history)
    }
}

/// Mean of the last `period` values, or `None` while fewer are available.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Puts the whole portfolio into one ticker on the first day and holds.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    pub ticker: String,
}

impl Strategy for BuyAndHold {
    fn on_day(&mut self, ledger: &mut Ledger, _history: &PriceHistory) -> Result<(), BacktestError> {
        if !ledger.is_held(&self.ticker) {
            ledger.buy(&self.ticker, 1.0)?;
        }
        Ok(())
    }
}

/// Holds `allocation` of one ticker while its fast SMA is above its slow SMA.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    pub ticker: String,
    pub fast: usize,
    pub slow: usize,
    pub allocation: f64,
}

impl Strategy for SmaCrossover {
    fn on_day(&mut self, ledger: &mut Ledger, history: &PriceHistory) -> Result<(), BacktestError> {
        let Some(closes) = history.closes(&self.ticker) else {
            return Ok(());
        };
        let (Some(fast), Some(slow)) = (sma(closes, self.fast), sma(closes, self.slow)) else {
            return Ok(());
        };

        let held = ledger.is_held(&self.ticker);
        if fast > slow && !held {
            ledger.buy(&self.ticker, self.allocation)?;
        } else if fast < slow && held {
            ledger.sell(&self.ticker, 1.0)?;
        }
        Ok(())
    }
}

/// Splits the portfolio evenly across `tickers`, rebalancing every
/// `rebalance_days` trading days.
#[derive(Debug, Clone)]
pub struct EqualWeight {
    pub tickers: Vec<String>,
    pub rebalance_days: usize,
    days_since_rebalance: Option<usize>,
}

impl EqualWeight {
    pub fn new(tickers: Vec<String>, rebalance_days: usize) -> Self {
        Self {
            tickers,
            rebalance_days: rebalance_days.max(1),
            days_since_rebalance: None,
        }
    }
}

impl Strategy for EqualWeight {
    fn on_day(&mut self, ledger: &mut Ledger, _history: &PriceHistory) -> Result<(), BacktestError> {
        if self.tickers.is_empty() {
            return Ok(());
        }
        let due = match self.days_since_rebalance {
            None => true,
            Some(days) => days + 1 >= self.rebalance_days,
        };
        if !due {
            self.days_since_rebalance = self.days_since_rebalance.map(|d| d + 1);
            return Ok(());
        }

        ledger.sell_all();
        let weight = 1.0 / self.tickers.len() as f64;
        for ticker in &self.tickers {
            ledger.buy(ticker, weight)?;
        }
        self.days_since_rebalance = Some(0);
        Ok(())
    }
}
