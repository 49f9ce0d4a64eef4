//! Configured entry point to the metric functions.

use tracing::debug;
use valuation_core::{FinancialSnapshot, Result, SnapshotHistory};

use crate::config::EngineConfig;
use crate::dcf::{DcfValuation, discounted_cash_flow};
use crate::growth::{self, FcfSignal};
use crate::metric::MetricResult;
use crate::ratios;
use crate::report::{DiscountRatePolicy, MetricsReport};
use crate::wacc::{WaccBreakdown, weighted_average_cost_of_capital};

/// Computes metrics under a fixed [`EngineConfig`].
///
/// The engine holds no mutable state and can be shared across threads. Every
/// method is a thin wrapper over the matching free function that adds input
/// tracing when [`EngineConfig::trace_inputs`] is set.
#[derive(Clone, Debug, Default)]
pub struct ValuationEngine {
    config: EngineConfig,
}

impl ValuationEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`valuation_core::ValuationError::InvalidParameter`] when the
    /// configuration is out of range.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn trace_snapshot(&self, snapshot: &FinancialSnapshot) {
        if self.config.trace_inputs {
            debug!(symbol = %snapshot.symbol(), ?snapshot, "snapshot inputs");
        }
    }

    fn trace_history(&self, history: &SnapshotHistory) {
        if self.config.trace_inputs {
            for (index, snapshot) in history.iter().enumerate() {
                debug!(symbol = %history.symbol(), index, ?snapshot, "history inputs");
            }
        }
    }

    fn traced(&self, symbol: &valuation_core::Symbol, result: MetricResult) -> MetricResult {
        if self.config.trace_inputs {
            debug!(%symbol, metric = %result.kind(), raw = ?result.raw(), status = ?result.status(), "computed");
        }
        result
    }

    /// See [`ratios::net_net`].
    #[must_use]
    pub fn net_net(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::net_net(snapshot))
    }

    /// See [`ratios::market_cap_to_equity`].
    #[must_use]
    pub fn market_cap_to_equity(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::market_cap_to_equity(snapshot))
    }

    /// See [`ratios::equity_to_debt`].
    #[must_use]
    pub fn equity_to_debt(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::equity_to_debt(snapshot))
    }

    /// See [`ratios::earnings_yield`].
    #[must_use]
    pub fn earnings_yield(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::earnings_yield(snapshot))
    }

    /// See [`ratios::return_on_assets`].
    #[must_use]
    pub fn return_on_assets(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::return_on_assets(snapshot))
    }

    /// See [`ratios::return_on_equity`].
    #[must_use]
    pub fn return_on_equity(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::return_on_equity(snapshot))
    }

    /// See [`ratios::return_on_capital`].
    #[must_use]
    pub fn return_on_capital(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::return_on_capital(snapshot))
    }

    /// See [`ratios::net_income_to_ev`].
    #[must_use]
    pub fn net_income_to_ev(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::net_income_to_ev(snapshot))
    }

    /// See [`ratios::net_margin`].
    #[must_use]
    pub fn net_margin(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::net_margin(snapshot))
    }

    /// See [`ratios::cash_ratio`].
    #[must_use]
    pub fn cash_ratio(&self, snapshot: &FinancialSnapshot) -> MetricResult {
        self.trace_snapshot(snapshot);
        self.traced(snapshot.symbol(), ratios::cash_ratio(snapshot))
    }

    /// See [`growth::average_earnings_growth`].
    #[must_use]
    pub fn average_earnings_growth(&self, history: &SnapshotHistory) -> MetricResult {
        self.trace_history(history);
        self.traced(history.symbol(), growth::average_earnings_growth(history))
    }

    /// See [`growth::average_fcf_growth`].
    #[must_use]
    pub fn average_fcf_growth(&self, history: &SnapshotHistory) -> MetricResult {
        self.trace_history(history);
        self.traced(history.symbol(), growth::average_fcf_growth(history))
    }

    /// See [`growth::average_return_on_assets`].
    #[must_use]
    pub fn average_return_on_assets(&self, history: &SnapshotHistory) -> MetricResult {
        self.trace_history(history);
        self.traced(history.symbol(), growth::average_return_on_assets(history))
    }

    /// See [`growth::average_return_on_equity`].
    #[must_use]
    pub fn average_return_on_equity(&self, history: &SnapshotHistory) -> MetricResult {
        self.trace_history(history);
        self.traced(history.symbol(), growth::average_return_on_equity(history))
    }

    /// See [`growth::average_return_on_capital`].
    #[must_use]
    pub fn average_return_on_capital(&self, history: &SnapshotHistory) -> MetricResult {
        self.trace_history(history);
        self.traced(history.symbol(), growth::average_return_on_capital(history))
    }

    /// See [`growth::free_cash_flow_signal`].
    #[must_use]
    pub fn free_cash_flow_signal(&self, history: &SnapshotHistory) -> FcfSignal {
        self.trace_history(history);
        let signal = growth::free_cash_flow_signal(history);
        if self.config.trace_inputs {
            debug!(symbol = %history.symbol(), %signal, "computed");
        }
        signal
    }

    /// WACC of the latest snapshot, with the history's average ROE as the
    /// cost of equity.
    #[must_use]
    pub fn wacc(&self, history: &SnapshotHistory) -> WaccBreakdown {
        let cost_of_equity = self.average_return_on_equity(history);
        let breakdown = weighted_average_cost_of_capital(history.latest(), &cost_of_equity);
        self.traced(history.symbol(), breakdown.rate.clone());
        breakdown
    }

    /// DCF valuation with the configured parameters.
    #[must_use]
    pub fn dcf(
        &self,
        snapshot: &FinancialSnapshot,
        growth_percent: f64,
        discount_rate: f64,
    ) -> DcfValuation {
        self.trace_snapshot(snapshot);
        let valuation =
            discounted_cash_flow(snapshot, growth_percent, discount_rate, &self.config.dcf);
        if self.config.trace_inputs {
            debug!(
                symbol = %snapshot.symbol(),
                growth_percent,
                discount_rate,
                trajectory = ?valuation.cash_flow_trajectory,
                terminal_value = ?valuation.terminal_value.raw(),
                value_per_share = ?valuation.value_per_share.raw(),
                "dcf"
            );
        }
        valuation
    }

    /// Every metric for `history`.
    #[must_use]
    pub fn report(
        &self,
        history: &SnapshotHistory,
        external_rate: Option<f64>,
        policy: &DiscountRatePolicy,
    ) -> MetricsReport {
        self.trace_history(history);
        let report = MetricsReport::compute(history, external_rate, policy, &self.config.dcf);
        if self.config.trace_inputs {
            for metric in report.metrics() {
                self.traced(history.symbol(), metric.clone());
            }
        }
        debug!(
            symbol = %history.symbol(),
            periods = report.periods,
            discount_source = %report.discount_rate.source,
            "report computed"
        );
        report
    }
}
