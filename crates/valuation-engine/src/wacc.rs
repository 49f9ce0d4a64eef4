//! Weighted average cost of capital.
//!
//! Market values of debt and equity are approximated by their book values
//! (long-term debt and stockholders' equity). The cost of equity is not
//! observable from statements, so callers pass an estimate; the engine uses
//! the average return on equity of the history as an investor-required-return
//! proxy (see [`crate::growth::average_return_on_equity`]). That proxy is a
//! simplification: a high-ROE company gets a high discount rate.

use serde::Serialize;
use valuation_core::FinancialSnapshot;

use crate::metric::{InvalidReason, MetricKind, MetricResult};

/// Components of a WACC estimate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaccBreakdown {
    /// Long-term debt used as the market value of debt.
    pub debt: f64,
    /// Stockholders' equity used as the market value of equity.
    pub equity: f64,
    /// Debt share of total capital, `None` when total capital is zero.
    pub debt_weight: Option<f64>,
    /// Equity share of total capital, `None` when total capital is zero.
    pub equity_weight: Option<f64>,
    /// Interest expense over debt.
    pub cost_of_debt: MetricResult,
    /// Tax expense over EBIT, clamped to `[0, 1]`.
    pub effective_tax_rate: MetricResult,
    /// The cost of equity that was supplied.
    pub cost_of_equity: MetricResult,
    /// The blended rate.
    pub rate: MetricResult,
}

/// Absolute interest expense over long-term debt.
#[must_use]
pub fn cost_of_debt(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::CostOfDebt,
        snapshot.interest_expense().unwrap_or(0.0).abs(),
        snapshot.long_term_debt(),
        "long-term debt",
    )
}

/// Absolute income tax expense over EBIT, clamped to `[0, 1]`.
///
/// A zero or missing EBIT yields a valid rate of zero so that a pre-tax WACC
/// can still be produced.
#[must_use]
pub fn effective_tax_rate(snapshot: &FinancialSnapshot) -> MetricResult {
    let ebit = snapshot.ebit().unwrap_or(0.0);
    if ebit == 0.0 {
        return MetricResult::valid(MetricKind::EffectiveTaxRate, 0.0);
    }
    let rate = snapshot.income_tax_expense().unwrap_or(0.0).abs() / ebit;
    MetricResult::valid(MetricKind::EffectiveTaxRate, rate.clamp(0.0, 1.0))
}

/// Estimates WACC from the latest snapshot and a cost-of-equity estimate.
///
/// The rate is invalid when total capital is zero, when long-term debt is
/// zero or absent (no cost of debt), or when `cost_of_equity` is invalid. No
/// fallback rate is ever substituted; choosing one is the caller's decision.
#[must_use]
pub fn weighted_average_cost_of_capital(
    snapshot: &FinancialSnapshot,
    cost_of_equity: &MetricResult,
) -> WaccBreakdown {
    let debt = snapshot.long_term_debt().unwrap_or(0.0);
    let equity = snapshot.stockholders_equity().unwrap_or(0.0);
    let total_capital = debt + equity;

    let (debt_weight, equity_weight) = if total_capital == 0.0 {
        (None, None)
    } else {
        (Some(debt / total_capital), Some(equity / total_capital))
    };

    let cost_of_debt = cost_of_debt(snapshot);
    let effective_tax_rate = effective_tax_rate(snapshot);

    let rate = match (
        debt_weight.zip(equity_weight),
        cost_of_debt.raw(),
        effective_tax_rate.raw(),
        cost_of_equity.raw(),
    ) {
        (None, ..) => MetricResult::invalid(
            MetricKind::Wacc,
            InvalidReason::ZeroDenominator {
                field: "total capital",
            },
        ),
        (_, None, ..) => MetricResult::invalid(
            MetricKind::Wacc,
            cost_of_debt
                .reason()
                .cloned()
                .unwrap_or(InvalidReason::Unavailable {
                    input: "cost of debt",
                }),
        ),
        (_, _, None, _) => MetricResult::invalid(
            MetricKind::Wacc,
            InvalidReason::Unavailable {
                input: "effective tax rate",
            },
        ),
        (_, _, _, None) => MetricResult::invalid(
            MetricKind::Wacc,
            InvalidReason::Unavailable {
                input: "cost of equity",
            },
        ),
        (Some((wd, we)), Some(kd), Some(tax), Some(ke)) => {
            MetricResult::valid(MetricKind::Wacc, wd * kd * (1.0 - tax) + we * ke)
        }
    };

    WaccBreakdown {
        debt,
        equity,
        debt_weight,
        equity_weight,
        cost_of_debt,
        effective_tax_rate,
        cost_of_equity: cost_of_equity.clone(),
        rate,
    }
}
