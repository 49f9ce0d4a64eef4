//! Discounted cash flow valuation.
//!
//! The projection uses a compounding-growth recurrence rather than a
//! textbook per-year NPV sum: each year the running cash flow grows by the
//! adjusted growth rate, and only that year's increment is discounted once by
//! `1 + r` before being folded back into the running total.
//!
//! ```text
//! cf_0     = net income * (1 - capital gains tax)
//! cf_{n+1} = cf_n + cf_n * g / (1 + r)          for n in 1..horizon
//! TV       = FCF * (1 + g_t) / (r - g_t)
//! value    = cf_{horizon-1} + TV - total liabilities - minority interest
//! ```

use serde::{Deserialize, Serialize};
use valuation_core::{FinancialSnapshot, Result, ValuationError};

use crate::metric::{InvalidReason, MetricKind, MetricResult, REPORTING_PRECISION, round_to};

/// Substitute for a terminal-value denominator that is exactly zero.
pub const TERMINAL_DENOMINATOR_FLOOR: f64 = 0.01;

/// Tunable inputs of the DCF model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfParameters {
    /// Years in the explicit projection, including the seed year.
    pub horizon_years: u32,
    /// Perpetual growth rate after the horizon.
    pub terminal_growth_rate: f64,
    /// Fraction shaved off the historical growth rate to stay conservative.
    pub earnings_markdown: f64,
    /// Tax applied to net income to get the seed cash flow.
    pub capital_gains_tax_rate: f64,
}

impl Default for DcfParameters {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            terminal_growth_rate: 0.04,
            earnings_markdown: 0.33,
            capital_gains_tax_rate: 0.15,
        }
    }
}

impl DcfParameters {
    /// Sets the projection horizon.
    #[must_use]
    pub const fn with_horizon_years(mut self, years: u32) -> Self {
        self.horizon_years = years;
        self
    }

    /// Sets the terminal growth rate.
    #[must_use]
    pub const fn with_terminal_growth_rate(mut self, rate: f64) -> Self {
        self.terminal_growth_rate = rate;
        self
    }

    /// Sets the growth markdown.
    #[must_use]
    pub const fn with_earnings_markdown(mut self, markdown: f64) -> Self {
        self.earnings_markdown = markdown;
        self
    }

    /// Sets the capital gains tax rate.
    #[must_use]
    pub const fn with_capital_gains_tax_rate(mut self, rate: f64) -> Self {
        self.capital_gains_tax_rate = rate;
        self
    }

    /// Checks the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::InvalidParameter`] for a zero horizon, a
    /// markdown or tax rate outside `[0, 1]`, or a non-finite terminal rate.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_years == 0 {
            return Err(ValuationError::InvalidParameter(
                "DCF horizon must be at least one year".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.earnings_markdown) {
            return Err(ValuationError::InvalidParameter(format!(
                "earnings markdown {} is outside [0, 1]",
                self.earnings_markdown
            )));
        }
        if !(0.0..=1.0).contains(&self.capital_gains_tax_rate) {
            return Err(ValuationError::InvalidParameter(format!(
                "capital gains tax rate {} is outside [0, 1]",
                self.capital_gains_tax_rate
            )));
        }
        if !self.terminal_growth_rate.is_finite() {
            return Err(ValuationError::InvalidParameter(
                "terminal growth rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a DCF valuation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DcfValuation {
    /// Historical growth after the markdown, as a fraction.
    pub adjusted_growth_rate: MetricResult,
    /// Rate the increments were discounted at.
    pub discount_rate: MetricResult,
    /// Terminal growth after the discount-rate guard.
    pub terminal_growth_rate: MetricResult,
    /// Running cash flow per year, seed first. Empty when the valuation could
    /// not run.
    pub cash_flow_trajectory: Vec<f64>,
    /// Cash flow at the end of the horizon.
    pub projected_cash_flow: MetricResult,
    /// Value of cash flows beyond the horizon.
    pub terminal_value: MetricResult,
    /// Projected cash flow plus terminal value less claims.
    pub total_intrinsic_value: MetricResult,
    /// Intrinsic value per share, rounded to cents.
    pub value_per_share: MetricResult,
    /// Current market price per share.
    pub current_price: MetricResult,
    /// Gap between value per share and price, in percent.
    pub implied_growth_percent: MetricResult,
}

impl DcfValuation {
    /// A valuation that could not run because `input` was invalid.
    #[must_use]
    pub fn unavailable(snapshot: &FinancialSnapshot, input: &'static str) -> Self {
        let reason = || InvalidReason::Unavailable { input };
        Self {
            adjusted_growth_rate: MetricResult::invalid(MetricKind::AdjustedGrowthRate, reason()),
            discount_rate: MetricResult::invalid(MetricKind::DiscountRate, reason()),
            terminal_growth_rate: MetricResult::invalid(MetricKind::TerminalGrowthRate, reason()),
            cash_flow_trajectory: Vec::new(),
            projected_cash_flow: MetricResult::invalid(MetricKind::ProjectedCashFlow, reason()),
            terminal_value: MetricResult::invalid(MetricKind::TerminalValue, reason()),
            total_intrinsic_value: MetricResult::invalid(MetricKind::IntrinsicValue, reason()),
            value_per_share: MetricResult::invalid(MetricKind::ValuePerShare, reason()),
            current_price: current_price(snapshot),
            implied_growth_percent: MetricResult::invalid(MetricKind::ImpliedGrowth, reason()),
        }
    }
}

fn current_price(snapshot: &FinancialSnapshot) -> MetricResult {
    match snapshot.price() {
        Some(price) => MetricResult::valid(MetricKind::CurrentPrice, price),
        None => MetricResult::invalid(
            MetricKind::CurrentPrice,
            InvalidReason::MissingInput {
                field: "current price",
            },
        ),
    }
}

/// Applies the conservatism markdown to a growth rate given in percent and
/// returns a fraction rounded to two places.
#[must_use]
pub fn adjusted_growth_rate(growth_percent: f64, markdown: f64) -> f64 {
    round_to(growth_percent / 100.0 * (1.0 - markdown), REPORTING_PRECISION)
}

/// Terminal growth capped below the discount rate.
///
/// When the discount rate does not exceed the terminal rate, the terminal
/// rate falls back to half the discount rate.
#[must_use]
pub fn guarded_terminal_growth(discount_rate: f64, terminal_growth_rate: f64) -> f64 {
    if discount_rate <= terminal_growth_rate {
        discount_rate * 0.5
    } else {
        terminal_growth_rate
    }
}

/// `discount - terminal`, with an exact zero replaced by
/// [`TERMINAL_DENOMINATOR_FLOOR`].
#[must_use]
pub fn terminal_denominator(discount_rate: f64, terminal_growth_rate: f64) -> f64 {
    let denominator = discount_rate - terminal_growth_rate;
    if denominator == 0.0 {
        TERMINAL_DENOMINATOR_FLOOR
    } else {
        denominator
    }
}

/// Projects the running cash flow for `horizon_years` values, seed included.
#[must_use]
pub fn project_cash_flows(
    seed: f64,
    growth_rate: f64,
    discount_rate: f64,
    horizon_years: u32,
) -> Vec<f64> {
    let mut trajectory = Vec::with_capacity(horizon_years.max(1) as usize);
    let mut cash_flow = seed;
    trajectory.push(cash_flow);
    for _ in 1..horizon_years {
        cash_flow += cash_flow * growth_rate / (1.0 + discount_rate);
        trajectory.push(cash_flow);
    }
    trajectory
}

/// Values the company in `snapshot`.
///
/// `growth_percent` is the historical earnings growth in percent (as produced
/// by [`crate::growth::average_earnings_growth`]); `discount_rate` is a
/// fraction, usually a WACC.
#[must_use]
pub fn discounted_cash_flow(
    snapshot: &FinancialSnapshot,
    growth_percent: f64,
    discount_rate: f64,
    params: &DcfParameters,
) -> DcfValuation {
    if !discount_rate.is_finite() || !growth_percent.is_finite() {
        let input = if discount_rate.is_finite() {
            "earnings growth"
        } else {
            "discount rate"
        };
        return DcfValuation::unavailable(snapshot, input);
    }

    let growth = adjusted_growth_rate(growth_percent, params.earnings_markdown);
    let seed = snapshot.net_income().unwrap_or(0.0) * (1.0 - params.capital_gains_tax_rate);
    let trajectory = project_cash_flows(seed, growth, discount_rate, params.horizon_years);
    let projected = trajectory.last().copied().unwrap_or(seed);

    let terminal_growth = guarded_terminal_growth(discount_rate, params.terminal_growth_rate);
    let denominator = terminal_denominator(discount_rate, terminal_growth);
    let free_cash_flow = snapshot.free_cash_flow().unwrap_or(0.0);
    let terminal_value = free_cash_flow * (1.0 + terminal_growth) / denominator;

    let total = projected + terminal_value
        - snapshot.total_liabilities().unwrap_or(0.0)
        - snapshot.minority_interest().unwrap_or(0.0);

    let total_intrinsic_value = MetricResult::valid(MetricKind::IntrinsicValue, total);
    let value_per_share = match total_intrinsic_value.raw() {
        Some(total) => MetricResult::quotient(
            MetricKind::ValuePerShare,
            total,
            snapshot.shares_outstanding(),
            "shares outstanding",
        ),
        None => MetricResult::invalid(
            MetricKind::ValuePerShare,
            InvalidReason::Unavailable {
                input: "intrinsic value",
            },
        ),
    };

    let current_price = current_price(snapshot);
    let implied_growth_percent = match value_per_share.value() {
        Some(per_share) => {
            let price = snapshot.price();
            let gap = MetricResult::quotient(
                MetricKind::ImpliedGrowth,
                per_share - price.unwrap_or(0.0),
                price,
                "current price",
            );
            match gap.raw() {
                Some(gap) => MetricResult::valid(
                    MetricKind::ImpliedGrowth,
                    round_to(gap, REPORTING_PRECISION) * 100.0,
                ),
                None => gap,
            }
        }
        None => MetricResult::invalid(
            MetricKind::ImpliedGrowth,
            InvalidReason::Unavailable {
                input: "value per share",
            },
        ),
    };

    DcfValuation {
        adjusted_growth_rate: MetricResult::valid(MetricKind::AdjustedGrowthRate, growth),
        discount_rate: MetricResult::valid(MetricKind::DiscountRate, discount_rate),
        terminal_growth_rate: MetricResult::valid(MetricKind::TerminalGrowthRate, terminal_growth),
        projected_cash_flow: MetricResult::valid(MetricKind::ProjectedCashFlow, projected),
        cash_flow_trajectory: trajectory,
        terminal_value: MetricResult::valid(MetricKind::TerminalValue, terminal_value),
        total_intrinsic_value,
        value_per_share,
        current_price,
        implied_growth_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> FinancialSnapshot {
        FinancialSnapshot::builder("DCF")
            .net_income(100.0)
            .operating_cash_flow(120.0)
            .capital_expenditures(20.0)
            .total_liabilities(500.0)
            .minority_interest(50.0)
            .shares_outstanding(100.0)
            .price(20.0)
            .build()
    }

    #[test]
    fn test_default_parameters() {
        let params = DcfParameters::default();
        assert_eq!(params.horizon_years, 10);
        assert_eq!(params.terminal_growth_rate, 0.04);
        assert_eq!(params.earnings_markdown, 0.33);
        assert_eq!(params.capital_gains_tax_rate, 0.15);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_parameter_validation() {
        assert!(
            DcfParameters::default()
                .with_horizon_years(0)
                .validate()
                .is_err()
        );
        assert!(
            DcfParameters::default()
                .with_earnings_markdown(1.5)
                .validate()
                .is_err()
        );
        assert!(
            DcfParameters::default()
                .with_capital_gains_tax_rate(-0.1)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_adjusted_growth_rate() {
        // 22.5% marked down by a third, rounded
        assert_eq!(adjusted_growth_rate(22.5, 0.33), 0.15);
        assert_eq!(adjusted_growth_rate(0.0, 0.33), 0.0);
    }

    #[test]
    fn test_terminal_guard_resets_to_half_discount() {
        let terminal = guarded_terminal_growth(0.04, 0.05);
        assert!((terminal - 0.02).abs() < 1e-12);
        let denominator = terminal_denominator(0.04, terminal);
        assert!((denominator - 0.02).abs() < 1e-12);
        assert_ne!(denominator, TERMINAL_DENOMINATOR_FLOOR);
    }

    #[test]
    fn test_terminal_guard_equal_rates() {
        assert!((guarded_terminal_growth(0.05, 0.05) - 0.025).abs() < 1e-12);
        assert_eq!(guarded_terminal_growth(0.08, 0.04), 0.04);
    }

    #[test]
    fn test_denominator_floor_for_zero_discount() {
        let terminal = guarded_terminal_growth(0.0, 0.04);
        assert_eq!(terminal, 0.0);
        assert_eq!(terminal_denominator(0.0, terminal), TERMINAL_DENOMINATOR_FLOOR);
    }

    #[test]
    fn test_projection_recurrence() {
        let trajectory = project_cash_flows(100.0, 0.1, 0.1, 3);
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory[0], 100.0);
        let step = 1.0 + 0.1 / 1.1;
        assert!((trajectory[1] - 100.0 * step).abs() < 1e-9);
        assert!((trajectory[2] - 100.0 * step * step).abs() < 1e-9);
    }

    #[test]
    fn test_single_year_horizon_is_seed_only() {
        assert_eq!(project_cash_flows(42.0, 0.5, 0.1, 1), vec![42.0]);
    }

    #[test]
    fn test_full_valuation() {
        let params = DcfParameters::default().with_horizon_years(3);
        let valuation = discounted_cash_flow(&company(), 15.0, 0.09, &params);

        // growth 0.15 * 0.67 = 0.1005 -> 0.1
        assert_eq!(valuation.adjusted_growth_rate.raw(), Some(0.1));
        assert_eq!(valuation.cash_flow_trajectory.len(), 3);
        assert!((valuation.cash_flow_trajectory[0] - 85.0).abs() < 1e-9);

        let step = 1.0 + 0.1 / 1.09;
        let projected = 85.0 * step * step;
        assert!((valuation.projected_cash_flow.raw().unwrap() - projected).abs() < 1e-9);

        let terminal = 100.0 * 1.04 / (0.09 - 0.04);
        assert!((valuation.terminal_value.raw().unwrap() - terminal).abs() < 1e-9);

        let total = projected + terminal - 500.0 - 50.0;
        assert!((valuation.total_intrinsic_value.raw().unwrap() - total).abs() < 1e-9);

        let per_share = round_to(valuation.total_intrinsic_value.raw().unwrap() / 100.0, 2);
        assert_eq!(valuation.value_per_share.value(), Some(per_share));
        assert_eq!(valuation.current_price.value(), Some(20.0));

        let implied = round_to((per_share - 20.0) / 20.0, 2) * 100.0;
        assert_eq!(valuation.implied_growth_percent.raw(), Some(implied));
    }

    #[test]
    fn test_implied_growth_rounds_ties_to_even() {
        // 1125 over 100 shares is 11.25 against a price of 10, a gap of exactly 0.125
        let snapshot = FinancialSnapshot::builder("TIE")
            .net_income(1125.0)
            .shares_outstanding(100.0)
            .price(10.0)
            .build();
        let params = DcfParameters::default()
            .with_horizon_years(1)
            .with_capital_gains_tax_rate(0.0);
        let valuation = discounted_cash_flow(&snapshot, 0.0, 0.09, &params);

        assert_eq!(valuation.terminal_value.raw(), Some(0.0));
        assert_eq!(valuation.total_intrinsic_value.raw(), Some(1125.0));
        assert_eq!(valuation.value_per_share.value(), Some(11.25));
        let implied = valuation.implied_growth_percent.raw().unwrap();
        assert!((implied - 12.0).abs() < 1e-9, "implied growth {implied}");
    }

    #[test]
    fn test_missing_shares_invalidates_per_share_values() {
        let snapshot = FinancialSnapshot::builder("DCF")
            .net_income(100.0)
            .price(10.0)
            .build();
        let valuation = discounted_cash_flow(&snapshot, 10.0, 0.08, &DcfParameters::default());
        assert!(valuation.total_intrinsic_value.is_valid());
        assert_eq!(
            valuation.value_per_share.reason(),
            Some(&InvalidReason::MissingInput {
                field: "shares outstanding"
            })
        );
        assert!(!valuation.implied_growth_percent.is_valid());
    }

    #[test]
    fn test_zero_price_invalidates_implied_growth() {
        let snapshot = FinancialSnapshot::builder("DCF")
            .net_income(100.0)
            .shares_outstanding(10.0)
            .price(0.0)
            .build();
        let valuation = discounted_cash_flow(&snapshot, 10.0, 0.08, &DcfParameters::default());
        assert!(valuation.value_per_share.is_valid());
        assert_eq!(
            valuation.implied_growth_percent.reason(),
            Some(&InvalidReason::ZeroDenominator {
                field: "current price"
            })
        );
    }

    #[test]
    fn test_non_finite_discount_rate() {
        let valuation =
            discounted_cash_flow(&company(), 10.0, f64::NAN, &DcfParameters::default());
        assert!(valuation.cash_flow_trajectory.is_empty());
        assert!(!valuation.total_intrinsic_value.is_valid());
        assert_eq!(valuation.current_price.value(), Some(20.0));
    }

    #[test]
    fn test_repeat_valuation_is_identical() {
        let params = DcfParameters::default();
        let first = discounted_cash_flow(&company(), 12.0, 0.07, &params);
        let second = discounted_cash_flow(&company(), 12.0, 0.07, &params);
        assert_eq!(first, second);
    }
}
