//! Backtest engine and day-stepping loop.
//!
//! `BacktestConfig` defines the simulated range and the benchmark whose
//! dates form the trading calendar.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::error::BacktestError;
use super::ledger::Ledger;
use super::price_series::PriceSeries;
use super::returns::DailyReturns;
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub benchmark: String,
}

/// Close prices seen so far, per ticker, through the current simulated day.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    date: Option<NaiveDate>,
    closes: BTreeMap<String, Vec<f64>>,
}

impl PriceHistory {
    pub fn new(date: Option<NaiveDate>, closes: BTreeMap<String, Vec<f64>>) -> Self {
        Self { date, closes }
    }

    /// The trading day being simulated; `None` only before the first day.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn closes(&self, ticker: &str) -> Option<&[f64]> {
        self.closes.get(ticker).map(Vec::as_slice)
    }

    pub fn latest_close(&self, ticker: &str) -> Option<f64> {
        self.closes.get(ticker).and_then(|c| c.last().copied())
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> + '_ {
        self.closes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.closes
            .iter()
            .map(|(ticker, closes)| (ticker.as_str(), closes.as_slice()))
    }
}

/// One simulation instance. Owns its ledger and returns series.
#[derive(Debug, Clone)]
pub struct Backtest {
    data: BTreeMap<String, PriceSeries>,
    config: BacktestConfig,
    ledger: Ledger,
    returns: DailyReturns,
}

impl Backtest {
    pub fn new(
        data: BTreeMap<String, PriceSeries>,
        config: BacktestConfig,
    ) -> Result<Self, BacktestError> {
        if config.start_date > config.end_date {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".into(),
                key: "start_date".into(),
                reason: "start_date must not be after end_date".into(),
            });
        }
        let benchmark = data.get(&config.benchmark).ok_or_else(|| {
            BacktestError::invalid_data(&config.benchmark, "benchmark ticker has no price data")
        })?;
        match benchmark.last_date() {
            Some(last) if last >= config.start_date => {}
            _ => {
                return Err(BacktestError::invalid_data(
                    &config.benchmark,
                    format!("no benchmark prices on or after {}", config.start_date),
                ));
            }
        }
        Ok(Self {
            data,
            config,
            ledger: Ledger::new(),
            returns: DailyReturns::new(),
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn returns(&self) -> &DailyReturns {
        &self.returns
    }

    fn benchmark(&self) -> &PriceSeries {
        // Presence is checked in `new` and `data` is never mutated.
        &self.data[&self.config.benchmark]
    }

    /// Benchmark dates falling inside the configured range.
    pub fn trading_days(&self) -> Vec<NaiveDate> {
        self.benchmark()
            .bars()
            .iter()
            .map(|bar| bar.date)
            .filter(|&d| d >= self.config.start_date && d <= self.config.end_date)
            .collect()
    }

    /// Close-to-close returns of the benchmark on each trading day.
    /// A trading day with no prior benchmark bar records 0.
    pub fn benchmark_returns(&self) -> Result<DailyReturns, BacktestError> {
        let benchmark = self.benchmark();
        let mut returns = DailyReturns::new();
        for date in self.trading_days() {
            let value = match benchmark.index_of(date) {
                Some(0) => 0.0,
                _ => benchmark.return_at(date)?,
            };
            returns.record(date, value)?;
        }
        Ok(returns)
    }

    /// Runs the simulation from `start_date` to `end_date`, aborting on the
    /// first error. Holdings and returns are reset at the start of each run.
    pub fn run<S: Strategy + ?Sized>(&mut self, strategy: &mut S) -> Result<(), BacktestError> {
        self.ledger.sell_all();
        self.returns.clear();

        let start = self.config.start_date;
        let end = self.config.end_date;
        info!(
            start = %start,
            end = %end,
            benchmark = %self.config.benchmark,
            tickers = self.data.len(),
            "starting backtest"
        );

        let mut history = PriceHistory {
            date: None,
            closes: self
                .data
                .iter()
                .map(|(ticker, series)| (ticker.clone(), series.closes_through(start)))
                .collect(),
        };

        let mut traded = 0usize;
        for date in start.iter_days().take_while(|d| *d <= end) {
            if !self.benchmark().contains(date) {
                continue;
            }

            let daily_return = self.accrue(date)?;
            self.returns.record(date, daily_return)?;

            self.append_history(&mut history, date)?;
            history.date = Some(date);

            strategy.on_day(&mut self.ledger, &history)?;
            self.ledger.check_invariants()?;

            debug!(%date, daily_return, holdings = self.ledger.len(), "simulated day");
            traded += 1;
        }

        info!(days = traded, "backtest complete");
        Ok(())
    }

    /// Portfolio return for `date` under the holdings from the previous day.
    fn accrue(&self, date: NaiveDate) -> Result<f64, BacktestError> {
        let mut total = 0.0;
        for (ticker, amount) in self.ledger.holdings() {
            if amount == 0.0 {
                continue;
            }
            let series = self.data.get(ticker).ok_or_else(|| {
                BacktestError::lookup(ticker, date, "held ticker has no price data")
            })?;
            total += amount * series.return_at(date)?;
        }
        Ok(total)
    }

    fn append_history(
        &self,
        history: &mut PriceHistory,
        date: NaiveDate,
    ) -> Result<(), BacktestError> {
        for (ticker, series) in &self.data {
            let close = series
                .close_at(date)
                .ok_or_else(|| BacktestError::lookup(ticker, date, "no price for trading day"))?;
            history.closes.entry(ticker.clone()).or_default().push(close);
        }
        Ok(())
    }
}
