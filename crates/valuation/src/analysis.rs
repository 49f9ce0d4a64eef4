//! Fetch-then-compute for a single ticker.

use tracing::{debug, instrument, warn};

use valuation_core::{PeriodType, Result, Symbol};
use valuation_engine::{DiscountRatePolicy, MetricsReport, ValuationEngine};

use crate::registry::ProviderRegistry;

/// Default number of reporting periods fetched per ticker.
pub const DEFAULT_PERIODS: usize = 4;

/// What to fetch for an analysis and how to pick the discount rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisOptions {
    /// Statement frequency.
    pub period_type: PeriodType,
    /// Periods of history requested from the provider.
    pub periods: usize,
    /// Overrides any provider with this discount rate.
    pub external_rate: Option<f64>,
    /// Whether to ask the registry's discount rate providers.
    pub fetch_external_rate: bool,
    /// Fallback when no external or computed rate is usable.
    pub policy: DiscountRatePolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            period_type: PeriodType::Annual,
            periods: DEFAULT_PERIODS,
            external_rate: None,
            fetch_external_rate: true,
            policy: DiscountRatePolicy::new(),
        }
    }
}

impl AnalysisOptions {
    /// Sets the statement frequency.
    #[must_use]
    pub const fn with_period_type(mut self, period_type: PeriodType) -> Self {
        self.period_type = period_type;
        self
    }

    /// Sets the number of periods requested.
    #[must_use]
    pub const fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    /// Uses `rate` as the external discount rate without asking providers.
    #[must_use]
    pub const fn with_external_rate(mut self, rate: Option<f64>) -> Self {
        self.external_rate = rate;
        self
    }

    /// Enables or disables discount rate providers.
    #[must_use]
    pub const fn with_fetch_external_rate(mut self, enabled: bool) -> Self {
        self.fetch_external_rate = enabled;
        self
    }

    /// Sets the caller default discount rate.
    #[must_use]
    pub const fn with_default_rate(mut self, rate: Option<f64>) -> Self {
        self.policy = self.policy.with_default_rate(rate);
        self
    }
}

/// Resolves the external discount rate for `symbol`.
///
/// A rate given in `options` wins. Otherwise the registry's rate providers
/// are asked; their failure is logged and treated as "no external rate".
pub async fn external_rate(
    registry: &ProviderRegistry,
    symbol: &Symbol,
    options: &AnalysisOptions,
) -> Option<f64> {
    if options.external_rate.is_some() {
        return options.external_rate;
    }
    if !options.fetch_external_rate || !registry.has_rate_providers() {
        return None;
    }
    match registry.fetch_discount_rate(symbol).await {
        Ok(rate) => Some(rate),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "external discount rate unavailable");
            None
        }
    }
}

/// Fetches the history for `symbol` and computes every metric.
///
/// # Errors
///
/// Fails when no provider can supply a snapshot history. A missing discount
/// rate is not an error; it only invalidates the DCF.
#[instrument(skip(registry, engine, options))]
pub async fn analyze_symbol(
    registry: &ProviderRegistry,
    engine: &ValuationEngine,
    symbol: &Symbol,
    options: &AnalysisOptions,
) -> Result<MetricsReport> {
    let history = registry
        .fetch_history(symbol, options.period_type, options.periods)
        .await?;
    debug!(symbol = %symbol, periods = history.len(), "history fetched");

    let rate = external_rate(registry, symbol, options).await;
    Ok(engine.report(&history, rate, &options.policy))
}
