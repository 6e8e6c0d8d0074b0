//! Holdings ledger: fractional allocation of the portfolio across tickers.
//!
//! Allocations are fractions of total portfolio value. Every value is
//! non-negative and the values sum to at most 1; whatever is not allocated
//! is cash earning nothing.

use std::collections::BTreeMap;

use super::error::BacktestError;

/// Slack allowed on the allocation total before it counts as over-allocated.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    holdings: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `percent` of the portfolio to `ticker`.
    ///
    /// `percent == 1` replaces every position with `ticker`. Otherwise the
    /// position is set directly when the other holdings leave enough
    /// unallocated; if they don't, the other holdings are shrunk in
    /// proportion so that they sum to `1 - percent`.
    pub fn buy(&mut self, ticker: &str, percent: f64) -> Result<(), BacktestError> {
        validate_percent(percent)?;

        if percent == 1.0 {
            self.holdings.clear();
            self.holdings.insert(ticker.to_string(), 1.0);
            return self.check_invariants();
        }

        let other_sum: f64 = self
            .holdings
            .iter()
            .filter(|(held, _)| held.as_str() != ticker)
            .map(|(_, amount)| amount)
            .sum();

        if 1.0 - other_sum >= percent {
            self.holdings.insert(ticker.to_string(), percent);
            return self.check_invariants();
        }

        // Unreachable while `percent < 1`: with nothing else held the room
        // check above always passes. Kept so a zero-sum rescale can never divide.
        debug_assert!(other_sum > 0.0, "rescale reached with empty remainder");
        if other_sum <= 0.0 {
            return Err(BacktestError::domain(
                "cannot rebalance into remaining allocation with no existing holdings",
            ));
        }

        self.holdings.remove(ticker);
        let remaining = 1.0 - percent;
        for amount in self.holdings.values_mut() {
            *amount = *amount / other_sum * remaining;
        }
        self.holdings.insert(ticker.to_string(), percent);
        self.check_invariants()
    }

    /// Sell `percent` of the existing `ticker` position (a fraction of the
    /// position, not of the portfolio). `percent == 1` liquidates it.
    pub fn sell(&mut self, ticker: &str, percent: f64) -> Result<(), BacktestError> {
        validate_percent(percent)?;

        if percent == 1.0 {
            return match self.holdings.remove(ticker) {
                Some(_) => Ok(()),
                None => Err(BacktestError::NotFound {
                    ticker: ticker.to_string(),
                }),
            };
        }

        let amount = self
            .holdings
            .get_mut(ticker)
            .ok_or_else(|| BacktestError::NotFound {
                ticker: ticker.to_string(),
            })?;
        *amount *= 1.0 - percent;
        self.check_invariants()
    }

    pub fn sell_all(&mut self) {
        self.holdings.clear();
    }

    pub fn allocation(&self, ticker: &str) -> Option<f64> {
        self.holdings.get(ticker).copied()
    }

    pub fn is_held(&self, ticker: &str) -> bool {
        self.holdings.contains_key(ticker)
    }

    /// Positions in ticker order.
    pub fn holdings(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.holdings
            .iter()
            .map(|(ticker, &amount)| (ticker.as_str(), amount))
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn total_allocation(&self) -> f64 {
        self.holdings.values().sum()
    }

    /// Unallocated share of the portfolio.
    pub fn cash(&self) -> f64 {
        (1.0 - self.total_allocation()).max(0.0)
    }

    pub fn check_invariants(&self) -> Result<(), BacktestError> {
        for (ticker, &amount) in &self.holdings {
            if !amount.is_finite() || amount < 0.0 {
                return Err(BacktestError::domain(format!(
                    "allocation for {ticker} is {amount}, expected a value in [0, 1]"
                )));
            }
        }
        let total = self.total_allocation();
        if total > 1.0 + ALLOCATION_TOLERANCE {
            return Err(BacktestError::domain(format!(
                "holdings sum to {total}, which exceeds the whole portfolio"
            )));
        }
        Ok(())
    }
}

fn validate_percent(percent: f64) -> Result<(), BacktestError> {
    if !percent.is_finite() || !(0.0..=1.0).contains(&percent) {
        return Err(BacktestError::domain(format!(
            "percent must be between 0 and 1, got {percent}"
        )));
    }
    Ok(())
}
