//! Full per-ticker metrics report and discount-rate selection.

use serde::Serialize;
use std::fmt;
use valuation_core::{Symbol, SnapshotHistory};

use crate::dcf::{DcfParameters, DcfValuation, discounted_cash_flow};
use crate::growth::{self, FcfSignal};
use crate::metric::{InvalidReason, MetricKind, MetricResult};
use crate::ratios;
use crate::wacc::{WaccBreakdown, weighted_average_cost_of_capital};

/// Where the discount rate of a valuation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRateSource {
    /// Supplied by a [`valuation_core::DiscountRateProvider`].
    External,
    /// The WACC computed from the snapshot.
    Computed,
    /// A default the caller asked for explicitly.
    CallerDefault,
    /// No usable rate.
    None,
}

impl fmt::Display for DiscountRateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Computed => write!(f, "computed"),
            Self::CallerDefault => write!(f, "default"),
            Self::None => write!(f, "none"),
        }
    }
}

/// The discount rate chosen for a valuation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscountRate {
    /// Origin of the rate.
    pub source: DiscountRateSource,
    /// The rate itself, as a fraction.
    pub rate: MetricResult,
}

/// Picks a discount rate: an external rate first, then the computed WACC,
/// then an explicit caller default. With none of these the rate is invalid
/// and so is the valuation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DiscountRatePolicy {
    default_rate: Option<f64>,
}

impl DiscountRatePolicy {
    /// Policy without a caller default.
    #[must_use]
    pub const fn new() -> Self {
        Self { default_rate: None }
    }

    /// Uses `rate` when neither an external nor a computed rate is usable.
    #[must_use]
    pub const fn with_default_rate(mut self, rate: Option<f64>) -> Self {
        self.default_rate = rate;
        self
    }

    /// The configured caller default.
    #[must_use]
    pub const fn default_rate(&self) -> Option<f64> {
        self.default_rate
    }

    /// Chooses between the candidates.
    #[must_use]
    pub fn resolve(&self, external: Option<f64>, computed: &MetricResult) -> DiscountRate {
        let usable = |rate: f64| rate.is_finite().then_some(rate);

        if let Some(rate) = external.and_then(usable) {
            return DiscountRate {
                source: DiscountRateSource::External,
                rate: MetricResult::valid(MetricKind::DiscountRate, rate),
            };
        }
        if let Some(rate) = computed.raw() {
            return DiscountRate {
                source: DiscountRateSource::Computed,
                rate: MetricResult::valid(MetricKind::DiscountRate, rate),
            };
        }
        if let Some(rate) = self.default_rate.and_then(usable) {
            return DiscountRate {
                source: DiscountRateSource::CallerDefault,
                rate: MetricResult::valid(MetricKind::DiscountRate, rate),
            };
        }
        DiscountRate {
            source: DiscountRateSource::None,
            rate: MetricResult::invalid(
                MetricKind::DiscountRate,
                computed.reason().cloned().unwrap_or(InvalidReason::Unavailable {
                    input: "discount rate",
                }),
            ),
        }
    }
}

/// Every metric for one ticker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsReport {
    /// The ticker.
    pub symbol: Symbol,
    /// Number of periods the history metrics were computed over.
    pub periods: usize,
    /// Market cap over net current asset value.
    pub net_net: MetricResult,
    /// Market cap over equity.
    pub market_cap_to_equity: MetricResult,
    /// Equity over total liabilities.
    pub equity_to_debt: MetricResult,
    /// EBIT over enterprise value.
    pub earnings_yield: MetricResult,
    /// Latest return on assets.
    pub return_on_assets: MetricResult,
    /// Latest return on equity.
    pub return_on_equity: MetricResult,
    /// Latest return on capital.
    pub return_on_capital: MetricResult,
    /// Net income over enterprise value.
    pub net_income_to_ev: MetricResult,
    /// Net income over revenue.
    pub net_margin: MetricResult,
    /// Cash over current liabilities.
    pub cash_ratio: MetricResult,
    /// Mean EBIT growth, percent.
    pub average_earnings_growth: MetricResult,
    /// Mean free cash flow growth, percent.
    pub average_fcf_growth: MetricResult,
    /// Mean return on assets.
    pub average_return_on_assets: MetricResult,
    /// Mean return on equity.
    pub average_return_on_equity: MetricResult,
    /// Mean return on capital.
    pub average_return_on_capital: MetricResult,
    /// Free cash flow health signal.
    pub fcf_signal: FcfSignal,
    /// WACC components.
    pub wacc: WaccBreakdown,
    /// Rate used for the DCF.
    pub discount_rate: DiscountRate,
    /// DCF valuation.
    pub dcf: DcfValuation,
}

impl MetricsReport {
    /// Computes every metric for `history`.
    ///
    /// `external_rate` is a discount rate already obtained from a provider;
    /// `policy` decides what to use when it is absent.
    #[must_use]
    pub fn compute(
        history: &SnapshotHistory,
        external_rate: Option<f64>,
        policy: &DiscountRatePolicy,
        params: &DcfParameters,
    ) -> Self {
        let latest = history.latest();

        let average_earnings_growth = growth::average_earnings_growth(history);
        let average_return_on_equity = growth::average_return_on_equity(history);
        let wacc = weighted_average_cost_of_capital(latest, &average_return_on_equity);
        let discount_rate = policy.resolve(external_rate, &wacc.rate);

        let dcf = match (average_earnings_growth.raw(), discount_rate.rate.raw()) {
            (Some(growth), Some(rate)) => discounted_cash_flow(latest, growth, rate, params),
            (None, _) => DcfValuation::unavailable(latest, "earnings growth"),
            (_, None) => DcfValuation::unavailable(latest, "discount rate"),
        };

        Self {
            symbol: history.symbol().clone(),
            periods: history.len(),
            net_net: ratios::net_net(latest),
            market_cap_to_equity: ratios::market_cap_to_equity(latest),
            equity_to_debt: ratios::equity_to_debt(latest),
            earnings_yield: ratios::earnings_yield(latest),
            return_on_assets: ratios::return_on_assets(latest),
            return_on_equity: ratios::return_on_equity(latest),
            return_on_capital: ratios::return_on_capital(latest),
            net_income_to_ev: ratios::net_income_to_ev(latest),
            net_margin: ratios::net_margin(latest),
            cash_ratio: ratios::cash_ratio(latest),
            average_earnings_growth,
            average_fcf_growth: growth::average_fcf_growth(history),
            average_return_on_assets: growth::average_return_on_assets(history),
            average_return_on_equity,
            average_return_on_capital: growth::average_return_on_capital(history),
            fcf_signal: growth::free_cash_flow_signal(history),
            wacc,
            discount_rate,
            dcf,
        }
    }

    /// Every scalar metric in display order.
    #[must_use]
    pub fn metrics(&self) -> Vec<&MetricResult> {
        vec![
            &self.net_net,
            &self.market_cap_to_equity,
            &self.equity_to_debt,
            &self.earnings_yield,
            &self.return_on_assets,
            &self.return_on_equity,
            &self.return_on_capital,
            &self.net_income_to_ev,
            &self.net_margin,
            &self.cash_ratio,
            &self.average_earnings_growth,
            &self.average_fcf_growth,
            &self.average_return_on_assets,
            &self.average_return_on_equity,
            &self.average_return_on_capital,
            &self.wacc.rate,
            &self.discount_rate.rate,
            &self.dcf.adjusted_growth_rate,
            &self.dcf.value_per_share,
            &self.dcf.current_price,
            &self.dcf.implied_growth_percent,
        ]
    }

    /// `ticker label: value` lines, one per metric.
    #[must_use]
    pub fn to_key_value_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .metrics()
            .into_iter()
            .map(|metric| key_value_line(&self.symbol, metric))
            .collect();
        lines.push(format!("{} fcf signal: {}", self.symbol, self.fcf_signal));
        lines.push(format!(
            "{} discount rate source: {}",
            self.symbol, self.discount_rate.source
        ));
        lines
    }
}

/// Renders one metric as `ticker label: value`.
#[must_use]
pub fn key_value_line(symbol: &Symbol, metric: &MetricResult) -> String {
    format!("{symbol} {}: {metric}", metric.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::FinancialSnapshot;

    fn history() -> SnapshotHistory {
        let period = |ebit: f64, net_income: f64| {
            FinancialSnapshot::builder("RPT")
                .ebit(ebit)
                .net_income(net_income)
                .stockholders_equity(500.0)
                .long_term_debt(500.0)
                .interest_expense(25.0)
                .income_tax_expense(ebit * 0.2)
                .total_liabilities(800.0)
                .total_assets(1_300.0)
                .operating_cash_flow(90.0)
                .capital_expenditures(30.0)
                .market_cap(2_000.0)
                .shares_outstanding(100.0)
                .price(20.0)
                .build()
        };
        SnapshotHistory::new(
            "RPT",
            vec![period(120.0, 60.0), period(100.0, 50.0), period(80.0, 40.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_policy_prefers_external() {
        let computed = MetricResult::valid(MetricKind::Wacc, 0.08);
        let policy = DiscountRatePolicy::new().with_default_rate(Some(0.07));
        let rate = policy.resolve(Some(0.09), &computed);
        assert_eq!(rate.source, DiscountRateSource::External);
        assert_eq!(rate.rate.raw(), Some(0.09));
    }

    #[test]
    fn test_policy_falls_back_in_order() {
        let computed = MetricResult::valid(MetricKind::Wacc, 0.08);
        let invalid = MetricResult::invalid(
            MetricKind::Wacc,
            InvalidReason::ZeroDenominator {
                field: "long-term debt",
            },
        );

        let policy = DiscountRatePolicy::new().with_default_rate(Some(0.07));
        assert_eq!(
            policy.resolve(None, &computed).source,
            DiscountRateSource::Computed
        );
        let fallback = policy.resolve(None, &invalid);
        assert_eq!(fallback.source, DiscountRateSource::CallerDefault);
        assert_eq!(fallback.rate.raw(), Some(0.07));

        let none = DiscountRatePolicy::new().resolve(Some(f64::NAN), &invalid);
        assert_eq!(none.source, DiscountRateSource::None);
        assert_eq!(
            none.rate.reason(),
            Some(&InvalidReason::ZeroDenominator {
                field: "long-term debt"
            })
        );
    }

    #[test]
    fn test_report_computes_everything() {
        let report = MetricsReport::compute(
            &history(),
            None,
            &DiscountRatePolicy::new(),
            &DcfParameters::default(),
        );
        assert_eq!(report.periods, 3);
        assert_eq!(report.average_earnings_growth.value(), Some(22.5));
        assert_eq!(report.return_on_equity.value(), Some(0.12));
        assert_eq!(report.discount_rate.source, DiscountRateSource::Computed);
        assert!(report.wacc.rate.is_valid());
        assert!(report.dcf.value_per_share.is_valid());
        assert_eq!(report.dcf.cash_flow_trajectory.len(), 10);
        assert_eq!(report.fcf_signal, FcfSignal::NotDistressed);
    }

    #[test]
    fn test_report_without_rate_has_invalid_dcf() {
        let snapshots = history()
            .iter()
            .map(|s| {
                FinancialSnapshot::builder("RPT")
                    .ebit(s.ebit())
                    .net_income(s.net_income())
                    .stockholders_equity(500.0)
                    .build()
            })
            .collect();
        let history = SnapshotHistory::new("RPT", snapshots).unwrap();
        let report = MetricsReport::compute(
            &history,
            None,
            &DiscountRatePolicy::new(),
            &DcfParameters::default(),
        );
        assert!(!report.wacc.rate.is_valid());
        assert_eq!(report.discount_rate.source, DiscountRateSource::None);
        assert_eq!(
            report.dcf.value_per_share.reason(),
            Some(&InvalidReason::Unavailable {
                input: "discount rate"
            })
        );
    }

    #[test]
    fn test_key_value_lines() {
        let report = MetricsReport::compute(
            &history(),
            Some(0.1),
            &DiscountRatePolicy::new(),
            &DcfParameters::default(),
        );
        let lines = report.to_key_value_lines();
        assert!(lines.contains(&"RPT avg earnings growth: 22.5%".to_string()));
        assert!(lines.contains(&"RPT discount rate: 0.1".to_string()));
        assert!(lines.contains(&"RPT discount rate source: external".to_string()));
        assert_eq!(lines.len(), report.metrics().len() + 2);
    }
}
