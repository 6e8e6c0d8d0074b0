//! Inline SVG charts for the HTML report.

use std::fmt::Write;

use crate::domain::metrics::{drawdown_series, EquityPoint};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

pub const STRATEGY_STROKE: &str = "#2563eb";
pub const BENCHMARK_STROKE: &str = "#9ca3af";
pub const DRAWDOWN_FILL: &str = "rgba(239,68,68,0.3)";

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn x_at(i: usize, len: usize) -> f64 {
    MARGIN_LEFT + (i as f64 / (len.saturating_sub(1)).max(1) as f64) * plot_width()
}

fn open_svg(svg: &mut String, title: &str) {
    let _ = writeln!(
        svg,
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    let _ = writeln!(
        svg,
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>",
        CHART_WIDTH, title
    );
    for (x1, y1, x2, y2) in [
        (MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, CHART_HEIGHT - MARGIN_BOTTOM),
        (
            MARGIN_LEFT,
            CHART_HEIGHT - MARGIN_BOTTOM,
            CHART_WIDTH - MARGIN_RIGHT,
            CHART_HEIGHT - MARGIN_BOTTOM,
        ),
    ] {
        let _ = writeln!(
            svg,
            "  <line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"#ccc\" stroke-width=\"1\"/>"
        );
    }
}

fn axis_labels(svg: &mut String, curve: &[EquityPoint], top: &str, mid: &str, bottom: &str) {
    for (y, label) in [
        (MARGIN_TOP + 5.0, top),
        (MARGIN_TOP + plot_height() / 2.0, mid),
        (CHART_HEIGHT - MARGIN_BOTTOM - 5.0, bottom),
    ] {
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>",
            MARGIN_LEFT - 5.0,
            y,
            label
        );
    }

    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return;
    };
    let mid_date = curve[curve.len() / 2].date;
    for (x, date) in [
        (MARGIN_LEFT, first.date),
        (MARGIN_LEFT + plot_width() / 2.0, mid_date),
        (CHART_WIDTH - MARGIN_RIGHT, last.date),
    ] {
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>",
            x, CHART_HEIGHT, date
        );
    }
}

fn line_path(curve: &[EquityPoint], y_scale: impl Fn(f64) -> f64) -> String {
    let mut path = String::new();
    for (i, point) in curve.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        let _ = write!(
            path,
            "{} {:.1} {:.1}",
            cmd,
            x_at(i, curve.len()),
            y_scale(point.equity)
        );
    }
    path
}

/// Cumulative return of the strategy, optionally overlaid with the benchmark.
/// Returns an empty string when there is nothing to plot.
pub fn cumulative_return_svg(strategy: &[EquityPoint], benchmark: Option<&[EquityPoint]>) -> String {
    if strategy.is_empty() {
        return String::new();
    }

    let all = strategy
        .iter()
        .chain(benchmark.unwrap_or_default().iter())
        .map(|p| p.equity - 1.0);
    let (min, max) = all.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = (max - min).max(0.01);
    let y_scale = |equity: f64| MARGIN_TOP + plot_height() - ((equity - 1.0 - min) / range) * plot_height();

    let mut svg = String::new();
    open_svg(&mut svg, "Cumulative Return (%)");
    axis_labels(
        &mut svg,
        strategy,
        &format!("{:.1}%", max * 100.0),
        &format!("{:.1}%", (max + min) * 50.0),
        &format!("{:.1}%", min * 100.0),
    );
    if let Some(bench) = benchmark.filter(|b| !b.is_empty()) {
        let _ = writeln!(
            svg,
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            line_path(bench, y_scale),
            BENCHMARK_STROKE
        );
    }
    let _ = writeln!(
        svg,
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
        line_path(strategy, y_scale),
        STRATEGY_STROKE
    );
    svg.push_str("</svg>");
    svg
}

/// Underwater chart of drawdown from the running peak.
pub fn drawdown_svg(curve: &[EquityPoint]) -> String {
    if curve.len() < 2 {
        return String::new();
    }

    let drawdowns = drawdown_series(curve);
    let max_dd = drawdowns
        .iter()
        .map(|p| p.equity)
        .fold(0.0, f64::max)
        .max(0.01);
    let y_scale = |dd: f64| MARGIN_TOP + (dd / max_dd) * plot_height();

    let last = drawdowns.len() - 1;
    let path = format!(
        "{} L {:.1} {:.1} L {:.1} {:.1} Z",
        line_path(&drawdowns, y_scale),
        x_at(last, drawdowns.len()),
        y_scale(0.0),
        x_at(0, drawdowns.len()),
        y_scale(0.0)
    );

    let mut svg = String::new();
    open_svg(&mut svg, "Drawdown (%)");
    axis_labels(
        &mut svg,
        curve,
        "0%",
        &format!("-{:.1}%", max_dd * 50.0),
        &format!("-{:.1}%", max_dd * 100.0),
    );
    let _ = writeln!(
        svg,
        "  <path d=\"{}\" fill=\"{}\" stroke=\"#ef4444\" stroke-width=\"1\"/>",
        path, DRAWDOWN_FILL
    );
    svg.push_str("</svg>");
    svg
}
