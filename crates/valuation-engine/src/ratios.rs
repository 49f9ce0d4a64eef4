//! Single-snapshot ratio metrics.
//!
//! Figures that are absent from the snapshot count as zero when they appear
//! in a numerator or inside a composite such as enterprise value. A
//! denominator that is absent, zero, or yields a non-finite quotient makes
//! the result invalid.

use valuation_core::FinancialSnapshot;

use crate::metric::{InvalidReason, MetricKind, MetricResult};

/// Weight applied to receivables in net current asset value.
pub const RECEIVABLES_WEIGHT: f64 = 0.75;

/// Weight applied to inventory in net current asset value.
pub const INVENTORY_WEIGHT: f64 = 0.5;

fn or_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Net current asset value: current assets plus discounted receivables and
/// inventory, less total liabilities. May be negative.
#[must_use]
pub fn net_current_asset_value(snapshot: &FinancialSnapshot) -> f64 {
    or_zero(snapshot.current_assets())
        + RECEIVABLES_WEIGHT * or_zero(snapshot.net_receivables())
        + INVENTORY_WEIGHT * or_zero(snapshot.inventory())
        - or_zero(snapshot.total_liabilities())
}

/// Enterprise value: market cap plus long-term debt less cash.
#[must_use]
pub fn enterprise_value(snapshot: &FinancialSnapshot) -> f64 {
    or_zero(snapshot.market_cap()) + or_zero(snapshot.long_term_debt())
        - or_zero(snapshot.cash_and_equivalents())
}

/// Net working capital plus fixed assets.
#[must_use]
pub fn capital_employed(snapshot: &FinancialSnapshot) -> f64 {
    let net_working_capital =
        or_zero(snapshot.current_assets()) - or_zero(snapshot.current_liabilities());
    net_working_capital + or_zero(snapshot.property_plant_equipment())
}

/// Graham net-net ratio: market cap over net current asset value.
///
/// A negative ratio is valid and means the market values the company above
/// its liquidation floor.
#[must_use]
pub fn net_net(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::NetNet,
        or_zero(snapshot.market_cap()),
        Some(net_current_asset_value(snapshot)),
        "net current asset value",
    )
}

/// Market capitalization over stockholders' equity.
///
/// Undefined when equity is absent, zero or negative.
#[must_use]
pub fn market_cap_to_equity(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::positive_quotient(
        MetricKind::MarketCapToEquity,
        or_zero(snapshot.market_cap()),
        snapshot.stockholders_equity(),
        "stockholders' equity",
    )
}

/// Stockholders' equity over total liabilities, the inverse of debt/equity.
#[must_use]
pub fn equity_to_debt(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::EquityToDebt,
        or_zero(snapshot.stockholders_equity()),
        snapshot.total_liabilities(),
        "total liabilities",
    )
}

/// EBIT over enterprise value.
#[must_use]
pub fn earnings_yield(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::EarningsYield,
        or_zero(snapshot.ebit()),
        Some(enterprise_value(snapshot)),
        "enterprise value",
    )
}

/// Net income over total assets.
#[must_use]
pub fn return_on_assets(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::ReturnOnAssets,
        or_zero(snapshot.net_income()),
        snapshot.total_assets(),
        "total assets",
    )
}

/// Net income over stockholders' equity.
#[must_use]
pub fn return_on_equity(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::ReturnOnEquity,
        or_zero(snapshot.net_income()),
        snapshot.stockholders_equity(),
        "stockholders' equity",
    )
}

/// EBIT over net working capital plus fixed assets.
#[must_use]
pub fn return_on_capital(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::ReturnOnCapital,
        or_zero(snapshot.ebit()),
        Some(capital_employed(snapshot)),
        "capital employed",
    )
}

/// Net income over enterprise value.
///
/// Undefined when market cap is not reported, since enterprise value would
/// then only reflect the balance sheet.
#[must_use]
pub fn net_income_to_ev(snapshot: &FinancialSnapshot) -> MetricResult {
    if snapshot.market_cap().is_none() {
        return MetricResult::invalid(
            MetricKind::NetIncomeToEv,
            InvalidReason::MissingInput {
                field: "market capitalization",
            },
        );
    }
    MetricResult::quotient(
        MetricKind::NetIncomeToEv,
        or_zero(snapshot.net_income()),
        Some(enterprise_value(snapshot)),
        "enterprise value",
    )
}

/// Net income over revenue.
#[must_use]
pub fn net_margin(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::NetMargin,
        or_zero(snapshot.net_income()),
        snapshot.revenue(),
        "revenue",
    )
}

/// Cash and equivalents over current liabilities.
#[must_use]
pub fn cash_ratio(snapshot: &FinancialSnapshot) -> MetricResult {
    MetricResult::quotient(
        MetricKind::CashRatio,
        or_zero(snapshot.cash_and_equivalents()),
        snapshot.current_liabilities(),
        "current liabilities",
    )
}
