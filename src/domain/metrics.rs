//! Performance statistics computed from a daily returns series.

use super::returns::{DailyReturns, ReturnPoint};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub best_day: f64,
    pub worst_day: f64,
    pub win_rate: f64,
    pub trading_days: usize,
}

impl Metrics {
    pub fn compute(returns: &DailyReturns, risk_free_rate: f64) -> Self {
        let values = returns.values();
        let curve = equity_curve(returns);

        let total_return = curve.last().map(|p| p.equity - 1.0).unwrap_or(0.0);

        let trading_days = values.len();
        let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
        let cagr = if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (volatility, sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&values, daily_rf);

        let best_day = values.iter().copied().fold(0.0_f64, f64::max);
        let worst_day = values.iter().copied().fold(0.0_f64, f64::min);

        let active: Vec<f64> = values.iter().copied().filter(|&r| r != 0.0).collect();
        let win_rate = if active.is_empty() {
            0.0
        } else {
            active.iter().filter(|&&r| r > 0.0).count() as f64 / active.len() as f64
        };

        Metrics {
            total_return,
            cagr,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            best_day,
            worst_day,
            win_rate,
            trading_days,
        }
    }
}

/// Growth of one unit of capital, compounded daily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

pub fn equity_curve(returns: &DailyReturns) -> Vec<EquityPoint> {
    let mut equity = 1.0;
    returns
        .points()
        .iter()
        .map(|&ReturnPoint { date, value }| {
            equity *= 1.0 + value;
            EquityPoint { date, equity }
        })
        .collect()
}

/// Fractional drawdown from the running peak at each point (0 at a new high).
pub fn drawdown_series(curve: &[EquityPoint]) -> Vec<EquityPoint> {
    let mut peak = 1.0_f64;
    curve
        .iter()
        .map(|point| {
            peak = peak.max(point.equity);
            let dd = if peak > 0.0 {
                (peak - point.equity) / peak
            } else {
                0.0
            };
            EquityPoint {
                date: point.date,
                equity: dd,
            }
        })
        .collect()
}

/// Compounded return per calendar month, keyed by (year, month).
pub fn monthly_returns(returns: &DailyReturns) -> BTreeMap<(i32, u32), f64> {
    let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in returns.points() {
        let key = (point.date.year(), point.date.month());
        let growth = monthly.entry(key).or_insert(1.0);
        *growth *= 1.0 + point.value;
    }
    monthly.values_mut().for_each(|g| *g -= 1.0);
    monthly
}

fn compute_drawdown(curve: &[EquityPoint]) -> (f64, i64) {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(returns: &[f64], daily_rf: f64) -> (f64, f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    let volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (volatility, sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_returns(values: &[f64]) -> DailyReturns {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut returns = DailyReturns::new();
        for (i, &v) in values.iter().enumerate() {
            returns
                .record(start + chrono::Duration::days(i as i64), v)
                .unwrap();
        }
        returns
    }

    #[test]
    fn metrics_empty_series() {
        let metrics = Metrics::compute(&DailyReturns::new(), 0.0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.cagr, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.trading_days, 0);
    }

    #[test]
    fn metrics_total_return_compounds() {
        let metrics = Metrics::compute(&make_returns(&[0.10, 0.10]), 0.0);
        assert_relative_eq!(metrics.total_return, 0.21, epsilon = 1e-12);
    }

    #[test]
    fn metrics_flat_series_has_zero_stats() {
        let metrics = Metrics::compute(&make_returns(&[0.0; 10]), 0.0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
    }

    #[test]
    fn metrics_cagr_over_one_year() {
        let mut values = vec![0.0; 252];
        values[0] = 0.10;
        let metrics = Metrics::compute(&make_returns(&values), 0.0);
        assert_relative_eq!(metrics.cagr, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn metrics_best_worst_and_win_rate() {
        let metrics = Metrics::compute(&make_returns(&[0.02, -0.01, 0.0, 0.03, -0.04]), 0.0);
        assert_eq!(metrics.best_day, 0.03);
        assert_eq!(metrics.worst_day, -0.04);
        assert_relative_eq!(metrics.win_rate, 0.5);
    }

    #[test]
    fn metrics_max_drawdown() {
        // equity: 1.1, 0.88, 0.968
        let curve = equity_curve(&make_returns(&[0.10, -0.20, 0.10]));
        let (dd, duration) = compute_drawdown(&curve);
        assert_relative_eq!(dd, 0.20, epsilon = 1e-12);
        assert_eq!(duration, 2);
    }

    #[test]
    fn metrics_drawdown_from_initial_capital() {
        let curve = equity_curve(&make_returns(&[-0.10]));
        let (dd, _) = compute_drawdown(&curve);
        assert_relative_eq!(dd, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn metrics_sharpe_positive_for_steady_gains() {
        let values: Vec<f64> = (0..100).map(|i| 0.001 + 0.0001 * (i % 3) as f64).collect();
        let metrics = Metrics::compute(&make_returns(&values), 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
    }

    #[test]
    fn metrics_sortino_finite_with_losses() {
        let metrics = Metrics::compute(&make_returns(&[0.01, -0.005, 0.01, -0.015, 0.02]), 0.0);
        assert!(metrics.sharpe_ratio.is_finite());
        assert!(metrics.sortino_ratio.is_finite());
        assert!(metrics.sortino_ratio != 0.0);
    }

    #[test]
    fn drawdown_series_tracks_peak() {
        let curve = equity_curve(&make_returns(&[0.10, -0.10, 0.20]));
        let dd = drawdown_series(&curve);
        assert_eq!(dd[0].equity, 0.0);
        assert_relative_eq!(dd[1].equity, 0.10, epsilon = 1e-12);
        assert_eq!(dd[2].equity, 0.0);
    }

    #[test]
    fn monthly_returns_compound_within_month() {
        let mut returns = DailyReturns::new();
        returns
            .record(NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(), 0.10)
            .unwrap();
        returns
            .record(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 0.10)
            .unwrap();
        returns
            .record(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), -0.05)
            .unwrap();

        let monthly = monthly_returns(&returns);
        assert_eq!(monthly.len(), 2);
        assert_relative_eq!(monthly[&(2024, 1)], 0.21, epsilon = 1e-12);
        assert_relative_eq!(monthly[&(2024, 2)], -0.05, epsilon = 1e-12);
    }
}
