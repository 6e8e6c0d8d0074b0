//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_returns_adapter::CsvReturnsAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report::HtmlReportAdapter;
use crate::domain::backtest::{Backtest, BacktestConfig};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_report_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::metrics::Metrics;
use crate::domain::price_series::PriceSeries;
use crate::domain::returns::DailyReturns;
use crate::domain::strategy::{BuyAndHold, EqualWeight, SmaCrossover, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportInput, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "fractrader", about = "Daily fractional-allocation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write its report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        returns_csv: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for ticker(s)
    Info {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            data_dir,
            returns_csv,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, output, data_dir, returns_csv)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { data_dir, ticker } => run_info(&data_dir, ticker.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    let config = FileConfigAdapter::from_file(path)?;
    info!(config = %path.display(), "loaded configuration");
    Ok(config)
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_report_config(config)?;
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    Ok(BacktestConfig {
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
        benchmark: config.require_string("backtest", "benchmark")?,
    })
}

/// Builds the configured strategy. `universe` is the set of tickers an
/// equal-weight strategy spreads across.
pub fn build_strategy(
    config: &dyn ConfigPort,
    universe: &[String],
) -> Result<(String, Box<dyn Strategy>), BacktestError> {
    let name = config.require_string("strategy", "name")?;
    let strategy: Box<dyn Strategy> = match name.as_str() {
        "buy_and_hold" => Box::new(BuyAndHold {
            ticker: config.require_string("strategy", "ticker")?,
        }),
        "sma_crossover" => Box::new(SmaCrossover {
            ticker: config.require_string("strategy", "ticker")?,
            fast: config.get_int("strategy", "fast", 0).max(1) as usize,
            slow: config.get_int("strategy", "slow", 0).max(1) as usize,
            allocation: config.get_double("strategy", "allocation", 1.0),
        }),
        "equal_weight" => Box::new(EqualWeight::new(
            universe.to_vec(),
            config.get_int("strategy", "rebalance_days", 20).max(1) as usize,
        )),
        other => {
            return Err(BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: "name".into(),
                reason: format!("unknown strategy {other:?}"),
            });
        }
    };
    Ok((name, strategy))
}

/// Tickers to load: the configured list, or every symbol the data port
/// knows. The benchmark and the strategy's own ticker are always included.
pub fn resolve_tickers(
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, BacktestError> {
    let mut tickers: Vec<String> = match config.get_string("backtest", "tickers") {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => data_port.list_symbols()?,
    };

    let required = [
        config.get_string("backtest", "benchmark"),
        config.get_string("strategy", "ticker"),
    ];
    for ticker in required.into_iter().flatten() {
        let ticker = ticker.trim().to_string();
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }

    tickers.sort();
    tickers.dedup();
    Ok(tickers)
}

/// Fetches every ticker into a price series. Tickers that fail to load are
/// skipped with a warning, except the benchmark.
pub fn load_data(
    data_port: &dyn DataPort,
    tickers: &[String],
    benchmark: &str,
) -> Result<BTreeMap<String, PriceSeries>, BacktestError> {
    let mut data = BTreeMap::new();
    for ticker in tickers {
        let loaded = data_port
            .fetch_ohlcv(ticker)
            .and_then(|bars| PriceSeries::new(ticker.clone(), bars));
        match loaded {
            Ok(series) if series.is_empty() && ticker != benchmark => {
                warn!(%ticker, "skipping ticker with no bars");
            }
            Ok(series) => {
                info!(%ticker, bars = series.len(), "loaded price data");
                data.insert(ticker.clone(), series);
            }
            Err(e) if ticker == benchmark => return Err(e),
            Err(e) => warn!(%ticker, error = %e, "skipping ticker"),
        }
    }
    Ok(data)
}

/// Everything produced by one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub strategy_name: String,
    pub config: BacktestConfig,
    pub returns: DailyReturns,
    pub benchmark_returns: DailyReturns,
}

/// Loads data, builds the strategy and runs the simulation.
pub fn execute_backtest(
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<BacktestOutcome, BacktestError> {
    validate_all(config)?;
    let bt_config = build_backtest_config(config)?;

    let tickers = resolve_tickers(config, data_port)?;
    let data = load_data(data_port, &tickers, &bt_config.benchmark)?;
    let universe: Vec<String> = data.keys().cloned().collect();
    let (strategy_name, mut strategy) = build_strategy(config, &universe)?;

    let mut backtest = Backtest::new(data, bt_config)?;
    backtest.run(strategy.as_mut())?;
    let benchmark_returns = backtest.benchmark_returns()?;

    Ok(BacktestOutcome {
        strategy_name,
        config: backtest.config().clone(),
        returns: backtest.returns().clone(),
        benchmark_returns,
    })
}

fn print_summary(outcome: &BacktestOutcome, risk_free_rate: f64) {
    let strategy = Metrics::compute(&outcome.returns, risk_free_rate);
    let benchmark = Metrics::compute(&outcome.benchmark_returns, risk_free_rate);

    eprintln!("\n=== Results: {} vs {} ===", outcome.strategy_name, outcome.config.benchmark);
    eprintln!("                  Strategy   Benchmark");
    eprintln!(
        "Total Return:     {:>7.2}%   {:>7.2}%",
        strategy.total_return * 100.0,
        benchmark.total_return * 100.0
    );
    eprintln!(
        "CAGR:             {:>7.2}%   {:>7.2}%",
        strategy.cagr * 100.0,
        benchmark.cagr * 100.0
    );
    eprintln!(
        "Sharpe Ratio:     {:>8.2}   {:>8.2}",
        strategy.sharpe_ratio, benchmark.sharpe_ratio
    );
    eprintln!(
        "Max Drawdown:     {:>7.1}%   {:>7.1}%",
        -strategy.max_drawdown * 100.0,
        -benchmark.max_drawdown * 100.0
    );
    eprintln!("Trading Days:     {:>8}", strategy.trading_days);
}

pub fn run_backtest(
    config_path: &Path,
    output_override: Option<PathBuf>,
    data_dir_override: Option<PathBuf>,
    returns_csv_override: Option<PathBuf>,
) -> Result<(), BacktestError> {
    info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;

    let data_dir = data_dir_override.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_string("backtest", "data_dir")
                .unwrap_or_else(|| "data".to_string()),
        )
    });
    let data_port = CsvAdapter::new(data_dir);

    let outcome = execute_backtest(&config, &data_port)?;
    let risk_free_rate = config.get_double("report", "risk_free_rate", 0.0);
    print_summary(&outcome, risk_free_rate);

    let input = ReportInput {
        strategy_name: &outcome.strategy_name,
        returns: &outcome.returns,
        benchmark: Some((outcome.config.benchmark.as_str(), &outcome.benchmark_returns)),
        start_date: outcome.config.start_date,
        end_date: outcome.config.end_date,
        risk_free_rate,
    };

    let output = output_override.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_string("report", "output")
                .unwrap_or_else(|| "report.html".to_string()),
        )
    });
    HtmlReportAdapter::new().write(&input, &output.to_string_lossy())?;
    eprintln!("\nReport written to: {}", output.display());

    let returns_csv =
        returns_csv_override.or_else(|| config.get_string("report", "returns_csv").map(PathBuf::from));
    if let Some(path) = returns_csv {
        CsvReturnsAdapter.write(&input, &path.to_string_lossy())?;
        eprintln!("Returns written to: {}", path.display());
    }
    Ok(())
}

pub fn run_dry_run(config_path: &Path) -> Result<(), BacktestError> {
    info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    validate_all(&config)?;
    let bt_config = build_backtest_config(&config)?;

    eprintln!("Config validated successfully");
    eprintln!("\nBacktest:");
    eprintln!("  range:     {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  benchmark: {}", bt_config.benchmark);
    match config.get_string("backtest", "tickers") {
        Some(tickers) => eprintln!("  tickers:   {}", tickers),
        None => eprintln!("  tickers:   (every CSV in data_dir)"),
    }
    describe_strategy(&config);

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn describe_strategy(config: &dyn ConfigPort) {
    let name = config.get_string("strategy", "name").unwrap_or_default();
    eprintln!("\nStrategy: {}", name);
    match name.as_str() {
        "buy_and_hold" => {
            eprintln!("  ticker: {}", config.get_string("strategy", "ticker").unwrap_or_default());
        }
        "sma_crossover" => {
            eprintln!("  ticker:     {}", config.get_string("strategy", "ticker").unwrap_or_default());
            eprintln!(
                "  fast/slow:  {}/{}",
                config.get_int("strategy", "fast", 0),
                config.get_int("strategy", "slow", 0)
            );
            eprintln!("  allocation: {}", config.get_double("strategy", "allocation", 1.0));
        }
        "equal_weight" => {
            eprintln!(
                "  rebalance every {} trading days",
                config.get_int("strategy", "rebalance_days", 20)
            );
        }
        _ => {}
    }
}

pub fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    validate_all(&config)?;
    describe_strategy(&config);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

pub fn run_info(data_dir: &Path, ticker: Option<&str>) -> Result<(), BacktestError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let tickers = match ticker {
        Some(t) => vec![t.to_string()],
        None => adapter.list_symbols()?,
    };

    if tickers.is_empty() {
        eprintln!("No CSV files found in {}", data_dir.display());
        return Ok(());
    }

    for t in &tickers {
        match adapter.get_data_range(t) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", t, count, min_date, max_date);
            }
            Ok(None) => eprintln!("{}: no data found", t),
            Err(e) if ticker.is_some() => return Err(e),
            Err(e) => eprintln!("error reading {}: {}", t, e),
        }
    }
    Ok(())
}
