//! Provider registry for managing multiple providers with fallback behavior.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use valuation_core::{
    DiscountRateProvider, FundamentalSnapshotProvider, PeriodType, Result, SnapshotHistory,
    Symbol, ValuationError,
};

/// Registry for managing multiple providers with automatic fallback.
///
/// The `ProviderRegistry` allows you to register multiple snapshot providers
/// and discount rate providers and will automatically try them in order
/// until one succeeds.
///
/// # Example
///
/// ```rust,ignore
/// use valuation::{ProviderRegistry, PeriodType, Symbol};
///
/// let registry = ProviderRegistry::new()
///     .with_yahoo()
///     .with_gurufocus();
///
/// let symbol = Symbol::new("AAPL");
/// let history = registry.fetch_history(&symbol, PeriodType::Annual, 4).await?;
/// let rate = registry.fetch_discount_rate(&symbol).await.ok();
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    snapshot_providers: Vec<Arc<dyn FundamentalSnapshotProvider>>,
    rate_providers: Vec<Arc<dyn DiscountRateProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "snapshot_providers",
                &self
                    .snapshot_providers
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .field(
                "rate_providers",
                &self
                    .rate_providers
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProviderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot provider.
    pub fn register_snapshot(&mut self, provider: Arc<dyn FundamentalSnapshotProvider>) {
        debug!(provider = provider.name(), "Registering snapshot provider");
        self.snapshot_providers.push(provider);
    }

    /// Register a discount rate provider.
    pub fn register_rate(&mut self, provider: Arc<dyn DiscountRateProvider>) {
        debug!(provider = provider.name(), "Registering discount rate provider");
        self.rate_providers.push(provider);
    }

    /// Returns true if at least one discount rate provider is registered.
    #[must_use]
    pub fn has_rate_providers(&self) -> bool {
        !self.rate_providers.is_empty()
    }

    /// Fetch a snapshot history, trying providers in order until one succeeds.
    ///
    /// Providers that do not publish `period_type` statements are skipped.
    #[instrument(skip(self))]
    pub async fn fetch_history(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<SnapshotHistory> {
        if self.snapshot_providers.is_empty() {
            return Err(ValuationError::ProviderNotConfigured(
                "No snapshot providers registered".to_string(),
            ));
        }

        let mut last_error = None;
        for provider in &self.snapshot_providers {
            if !provider.supports_period(period_type) {
                debug!(
                    provider = provider.name(),
                    period_type = %period_type,
                    "Provider does not support period type, skipping"
                );
                continue;
            }

            debug!(
                provider = provider.name(),
                symbol = %symbol,
                "Fetching snapshot history"
            );

            match provider.fetch_history(symbol, period_type, periods).await {
                Ok(history) => return Ok(history),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ValuationError::NotSupported(format!(
                "No registered provider supports {period_type} statements"
            ))
        }))
    }

    /// Fetch an external discount rate, trying providers in order until one
    /// succeeds.
    #[instrument(skip(self))]
    pub async fn fetch_discount_rate(&self, symbol: &Symbol) -> Result<f64> {
        if self.rate_providers.is_empty() {
            return Err(ValuationError::ProviderNotConfigured(
                "No discount rate providers registered".to_string(),
            ));
        }

        let mut last_error = None;
        for provider in &self.rate_providers {
            debug!(
                provider = provider.name(),
                symbol = %symbol,
                "Fetching discount rate"
            );

            match provider.fetch_discount_rate(symbol).await {
                Ok(rate) => return Ok(rate),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ValuationError::RateUnavailable {
            symbol: symbol.to_string(),
            reason: "all providers failed with no error".to_string(),
        }))
    }

    // Builder methods for easy setup with specific providers

    /// Add the Yahoo Finance provider.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(mut self) -> Self {
        self.register_snapshot(Arc::new(valuation_yahoo::YahooProvider::new()));
        self
    }

    /// Add the Financial Modeling Prep provider.
    #[cfg(feature = "fmp")]
    #[must_use]
    pub fn with_fmp(mut self, api_key: &str) -> Self {
        self.register_snapshot(Arc::new(valuation_fmp::FmpProvider::new(api_key)));
        self
    }

    /// Add the GuruFocus WACC provider.
    #[cfg(feature = "gurufocus")]
    #[must_use]
    pub fn with_gurufocus(mut self) -> Self {
        self.register_rate(Arc::new(valuation_gurufocus::GuruFocusProvider::new()));
        self
    }
}
