//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for fractrader.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("ticker {ticker} is not currently held")]
    NotFound { ticker: String },

    #[error("domain error: {reason}")]
    Domain { reason: String },

    #[error("lookup error for {ticker} on {date}: {reason}")]
    Lookup {
        ticker: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("invalid data for {ticker}: {reason}")]
    InvalidData { ticker: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        BacktestError::Domain {
            reason: reason.into(),
        }
    }

    pub(crate) fn lookup(ticker: &str, date: NaiveDate, reason: impl Into<String>) -> Self {
        BacktestError::Lookup {
            ticker: ticker.to_string(),
            date,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_data(ticker: &str, reason: impl Into<String>) -> Self {
        BacktestError::InvalidData {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::InvalidData { .. } => 3,
            BacktestError::NotFound { .. } | BacktestError::Domain { .. } => 4,
            BacktestError::Lookup { .. } => 5,
            BacktestError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
