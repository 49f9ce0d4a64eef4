//! Error types for data operations.
//!
//! This module defines [`ValuationError`] which covers every failure a data
//! source or a caller-side contract check can report. Degenerate metric
//! computations (zero denominators, missing line items) are not errors; the
//! engine reports those as invalid metric results instead.

use thiserror::Error;

/// Errors that can occur while fetching or assembling valuation inputs.
#[derive(Error, Debug)]
pub enum ValuationError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider could not produce a snapshot or history for the symbol.
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable {
        /// The symbol that was requested.
        symbol: String,
        /// Why no data could be produced.
        reason: String,
    },

    /// An external cost-of-capital estimate could not be obtained.
    #[error("Discount rate unavailable for {symbol}: {reason}")]
    RateUnavailable {
        /// The symbol that was requested.
        symbol: String,
        /// Why no rate could be produced.
        reason: String,
    },

    /// A snapshot history was constructed without any periods.
    #[error("Snapshot history for {0} is empty")]
    EmptyHistory(String),

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Authentication failed for a provider.
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl ValuationError {
    /// Returns true if this error means the provider produced no data for the
    /// symbol, as opposed to a transport or configuration failure.
    #[must_use]
    pub const fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            Self::SymbolNotFound(_) | Self::DataUnavailable { .. } | Self::EmptyHistory(_)
        )
    }
}

/// Result type alias using [`ValuationError`].
pub type Result<T> = std::result::Result<T, ValuationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ValuationError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "no balance sheet".to_string(),
        };
        assert_eq!(err.to_string(), "Data unavailable for AAPL: no balance sheet");

        let err = ValuationError::EmptyHistory("MSFT".to_string());
        assert_eq!(err.to_string(), "Snapshot history for MSFT is empty");
    }

    #[test]
    fn test_is_data_unavailable() {
        assert!(ValuationError::SymbolNotFound("X".to_string()).is_data_unavailable());
        assert!(ValuationError::EmptyHistory("X".to_string()).is_data_unavailable());
        assert!(!ValuationError::Network("timeout".to_string()).is_data_unavailable());
        assert!(
            !ValuationError::RateUnavailable {
                symbol: "X".to_string(),
                reason: "no match".to_string(),
            }
            .is_data_unavailable()
        );
    }
}
