//! Provider traits for fetching valuation inputs.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FundamentalSnapshotProvider`] - Financial statement snapshots and histories
//! - [`DiscountRateProvider`] - Externally published cost-of-capital estimates

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{Result, ValuationError},
    frequency::PeriodType,
    types::{FinancialSnapshot, SnapshotHistory, Symbol},
};

/// Base trait for all data providers.
///
/// All data providers must implement this trait to provide basic metadata
/// about the provider and its capabilities.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Returns the reporting periods supported by this provider.
    fn supported_periods(&self) -> &[PeriodType];

    /// Returns true if statements for `period_type` can be fetched.
    fn supports_period(&self, period_type: PeriodType) -> bool {
        self.supported_periods().contains(&period_type)
    }
}

/// Provider for accounting snapshots.
///
/// Implement this trait to supply the balance sheet, income statement, cash
/// flow and market figures the metrics engine consumes.
#[async_trait]
pub trait FundamentalSnapshotProvider: DataProvider {
    /// Fetches up to `periods` snapshots for a symbol, newest first.
    ///
    /// Market figures (capitalization, shares outstanding, price) are attached
    /// to the most recent snapshot only.
    ///
    /// # Errors
    ///
    /// Fails with [`ValuationError::SymbolNotFound`] or
    /// [`ValuationError::DataUnavailable`] when the provider has nothing for
    /// the symbol, and with transport errors when it cannot be reached.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<SnapshotHistory>;

    /// Fetches the most recent annual snapshot for a symbol.
    ///
    /// Default implementation requests a one-period history.
    async fn fetch_snapshot(&self, symbol: &Symbol) -> Result<FinancialSnapshot> {
        let history = self.fetch_history(symbol, PeriodType::Annual, 1).await?;
        Ok(history.into_inner().swap_remove(0))
    }
}

/// Provider for an externally estimated discount rate (WACC).
#[async_trait]
pub trait DiscountRateProvider: DataProvider {
    /// Fetches the weighted average cost of capital as a fraction (0.07 = 7%).
    ///
    /// # Errors
    ///
    /// Fails with [`ValuationError::RateUnavailable`] when no estimate can be
    /// produced. Implementations never substitute a default rate.
    async fn fetch_discount_rate(&self, symbol: &Symbol) -> Result<f64>;
}

/// Checks a requested period count before a provider goes to the network.
///
/// # Errors
///
/// Returns [`ValuationError::InvalidParameter`] when `periods` is zero.
pub fn ensure_periods(periods: usize) -> Result<()> {
    if periods == 0 {
        return Err(ValuationError::InvalidParameter(
            "at least one period must be requested".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedProvider;

    impl DataProvider for FixedProvider {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn description(&self) -> &str {
            "Returns canned snapshots"
        }

        fn supported_periods(&self) -> &[PeriodType] {
            &[PeriodType::Annual]
        }
    }

    #[async_trait]
    impl FundamentalSnapshotProvider for FixedProvider {
        async fn fetch_history(
            &self,
            symbol: &Symbol,
            _period_type: PeriodType,
            periods: usize,
        ) -> Result<SnapshotHistory> {
            ensure_periods(periods)?;
            let snapshots = (0..periods)
                .map(|i| {
                    FinancialSnapshot::builder(symbol.clone())
                        .net_income(100.0 - i as f64)
                        .build()
                })
                .collect();
            SnapshotHistory::new(symbol.clone(), snapshots)
        }
    }

    #[tokio::test]
    async fn test_default_fetch_snapshot_takes_latest() {
        let provider = FixedProvider;
        let snapshot = provider.fetch_snapshot(&Symbol::new("abc")).await.unwrap();
        assert_eq!(snapshot.net_income(), Some(100.0));
        assert_eq!(snapshot.symbol().as_str(), "ABC");
    }

    #[tokio::test]
    async fn test_zero_periods_rejected() {
        let provider = FixedProvider;
        let err = provider
            .fetch_history(&Symbol::new("abc"), PeriodType::Annual, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ValuationError::InvalidParameter(_)));
    }
}
