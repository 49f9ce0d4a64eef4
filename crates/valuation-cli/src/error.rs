use std::path::PathBuf;

use thiserror::Error;
use valuation::ValuationError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    Usage(String),

    #[error("{failed} of {total} tickers could not be fetched")]
    TickersFailed { failed: usize, total: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub(crate) const fn exit_code(&self) -> u8 {
        match self {
            Self::Valuation(ValuationError::InvalidParameter(_))
            | Self::Valuation(ValuationError::ProviderNotConfigured(_)) => 2,
            Self::Valuation(ValuationError::Io(_)) => 10,
            Self::Valuation(_) => 3,
            Self::Config { .. } | Self::Usage(_) => 2,
            Self::TickersFailed { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Valuation(ValuationError::InvalidParameter("x".into())).exit_code(),
            2
        );
        assert_eq!(
            CliError::Valuation(ValuationError::SymbolNotFound("X".into())).exit_code(),
            3
        );
        assert_eq!(
            CliError::Valuation(ValuationError::Io(std::io::Error::other("disk"))).exit_code(),
            10
        );
        assert_eq!(CliError::TickersFailed { failed: 1, total: 2 }.exit_code(), 3);
        assert_eq!(CliError::Usage("missing key".into()).exit_code(), 2);
    }

    #[test]
    fn test_tickers_failed_message() {
        let err = CliError::TickersFailed { failed: 1, total: 3 };
        assert_eq!(err.to_string(), "1 of 3 tickers could not be fetched");
    }
}
