//! HTML report adapter implementing ReportPort.
//!
//! Renders an Askama template with a strategy-versus-benchmark metrics
//! table, inline SVG charts and a monthly returns grid.

pub mod chart_svg;

use std::fs;
use std::path::Path;

use askama::Template;
use tracing::info;

use crate::domain::error::BacktestError;
use crate::domain::metrics::{equity_curve, monthly_returns, Metrics};
use crate::domain::returns::DailyReturns;
use crate::ports::report_port::{ReportInput, ReportPort};

struct MetricRow {
    label: &'static str,
    strategy: String,
    benchmark: String,
}

struct MonthlyReturnRow {
    year: i32,
    months: Vec<String>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    strategy_name: &'a str,
    benchmark_name: &'a str,
    has_benchmark: bool,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    metric_rows: Vec<MetricRow>,
    returns_svg: String,
    drawdown_svg: String,
    monthly_returns: Vec<MonthlyReturnRow>,
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn ratio(value: f64) -> String {
    format!("{:.2}", value)
}

fn metric_rows(strategy: &Metrics, benchmark: Option<&Metrics>) -> Vec<MetricRow> {
    let rows: [(&'static str, fn(&Metrics) -> String); 10] = [
        ("Total Return", |m| pct(m.total_return)),
        ("CAGR", |m| pct(m.cagr)),
        ("Volatility (ann.)", |m| pct(m.volatility)),
        ("Sharpe Ratio", |m| ratio(m.sharpe_ratio)),
        ("Sortino Ratio", |m| ratio(m.sortino_ratio)),
        ("Max Drawdown", |m| pct(-m.max_drawdown)),
        ("Longest Drawdown (days)", |m| m.max_drawdown_duration.to_string()),
        ("Best Day", |m| pct(m.best_day)),
        ("Worst Day", |m| pct(m.worst_day)),
        ("Win Rate", |m| pct(m.win_rate)),
    ];
    rows.into_iter()
        .map(|(label, render)| MetricRow {
            label,
            strategy: render(strategy),
            benchmark: benchmark.map(|m| render(m)).unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn monthly_rows(returns: &DailyReturns) -> Vec<MonthlyReturnRow> {
    let monthly = monthly_returns(returns);
    let (Some(&(min_year, _)), Some(&(max_year, _))) =
        (monthly.keys().next(), monthly.keys().next_back())
    else {
        return Vec::new();
    };

    (min_year..=max_year)
        .map(|year| MonthlyReturnRow {
            year,
            months: (1..=12u32)
                .map(|month| {
                    monthly
                        .get(&(year, month))
                        .map(|&r| format!("{:.1}", r * 100.0))
                        .unwrap_or_default()
                })
                .collect(),
        })
        .collect()
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, input: &ReportInput<'_>) -> Result<String, BacktestError> {
        let strategy_metrics = Metrics::compute(input.returns, input.risk_free_rate);
        let benchmark_metrics = input
            .benchmark
            .map(|(_, returns)| Metrics::compute(returns, input.risk_free_rate));

        let strategy_curve = equity_curve(input.returns);
        let benchmark_curve = input.benchmark.map(|(_, returns)| equity_curve(returns));

        let template = ReportTemplate {
            strategy_name: input.strategy_name,
            benchmark_name: input.benchmark.map(|(name, _)| name).unwrap_or(""),
            has_benchmark: input.benchmark.is_some(),
            start_date: input.start_date,
            end_date: input.end_date,
            metric_rows: metric_rows(&strategy_metrics, benchmark_metrics.as_ref()),
            returns_svg: chart_svg::cumulative_return_svg(
                &strategy_curve,
                benchmark_curve.as_deref(),
            ),
            drawdown_svg: chart_svg::drawdown_svg(&strategy_curve),
            monthly_returns: monthly_rows(input.returns),
        };

        template.render().map_err(|e| BacktestError::Report {
            reason: e.to_string(),
        })
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, input: &ReportInput<'_>, output_path: &str) -> Result<(), BacktestError> {
        let html = self.render(input)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;
        info!(path = %path.display(), "wrote HTML report");
        Ok(())
    }
}
