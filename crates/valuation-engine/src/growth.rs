//! History-based metrics.
//!
//! Two families live here and must not be confused:
//!
//! - growth rates compare period `i` with the older period `i + 1`;
//! - return averages take the mean of a same-period ratio over every period.
//!
//! Histories are ordered newest first.

use serde::Serialize;
use std::fmt;
use valuation_core::{FinancialSnapshot, SnapshotHistory};

use crate::metric::{InvalidReason, MetricKind, MetricResult};
use crate::ratios;

/// Periods required before any growth rate can be computed.
pub const MIN_GROWTH_PERIODS: usize = 2;

/// Coarse free cash flow health signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FcfSignal {
    /// Free cash flow is negative at both ends of the history.
    Distressed,
    /// At least one end of the history shows non-negative free cash flow.
    NotDistressed,
}

impl FcfSignal {
    /// Returns true for [`FcfSignal::Distressed`].
    #[must_use]
    pub const fn is_distressed(&self) -> bool {
        matches!(self, Self::Distressed)
    }
}

impl fmt::Display for FcfSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distressed => write!(f, "distressed"),
            Self::NotDistressed => write!(f, "not distressed"),
        }
    }
}

/// Mean period-over-period growth of `figure`, in percent.
///
/// A pair whose older value is zero or absent contributes nothing. A missing
/// newer value counts as zero.
fn average_growth(
    kind: MetricKind,
    history: &SnapshotHistory,
    figure: impl Fn(&FinancialSnapshot) -> Option<f64>,
) -> MetricResult {
    if history.len() < MIN_GROWTH_PERIODS {
        return MetricResult::invalid(
            kind,
            InvalidReason::InsufficientHistory {
                required: MIN_GROWTH_PERIODS,
                available: history.len(),
            },
        );
    }

    let rates: Vec<f64> = history
        .pairs()
        .filter_map(|(newer, older)| {
            let base = figure(older).filter(|v| *v != 0.0)?;
            let rate = (figure(newer).unwrap_or(0.0) - base) / base;
            rate.is_finite().then_some(rate)
        })
        .collect();

    if rates.is_empty() {
        return MetricResult::invalid(kind, InvalidReason::NoValidTerms);
    }

    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    MetricResult::valid(kind, mean * 100.0)
}

/// Mean of a same-period ratio across every period, skipping periods where
/// the ratio is undefined.
fn average_ratio(
    kind: MetricKind,
    history: &SnapshotHistory,
    ratio: impl Fn(&FinancialSnapshot) -> MetricResult,
) -> MetricResult {
    let values: Vec<f64> = history.iter().filter_map(|s| ratio(s).raw()).collect();

    if values.is_empty() {
        return MetricResult::invalid(kind, InvalidReason::NoValidTerms);
    }

    MetricResult::valid(kind, values.iter().sum::<f64>() / values.len() as f64)
}

/// Average EBIT growth rate across adjacent periods, in percent.
///
/// With EBIT `[120, 100, 80]` (newest first) the pairwise rates are 20% and
/// 25%, so the result is 22.5.
#[must_use]
pub fn average_earnings_growth(history: &SnapshotHistory) -> MetricResult {
    average_growth(
        MetricKind::AverageEarningsGrowth,
        history,
        FinancialSnapshot::ebit,
    )
}

/// Average free cash flow growth rate across adjacent periods, in percent.
#[must_use]
pub fn average_fcf_growth(history: &SnapshotHistory) -> MetricResult {
    average_growth(
        MetricKind::AverageFcfGrowth,
        history,
        FinancialSnapshot::free_cash_flow,
    )
}

/// Mean return on assets over every period in the history.
#[must_use]
pub fn average_return_on_assets(history: &SnapshotHistory) -> MetricResult {
    average_ratio(
        MetricKind::AverageReturnOnAssets,
        history,
        ratios::return_on_assets,
    )
}

/// Mean return on equity over every period in the history.
///
/// This is the figure [`crate::wacc`] uses as the cost-of-equity proxy.
#[must_use]
pub fn average_return_on_equity(history: &SnapshotHistory) -> MetricResult {
    average_ratio(
        MetricKind::AverageReturnOnEquity,
        history,
        ratios::return_on_equity,
    )
}

/// Mean return on capital over every period in the history.
#[must_use]
pub fn average_return_on_capital(history: &SnapshotHistory) -> MetricResult {
    average_ratio(
        MetricKind::AverageReturnOnCapital,
        history,
        ratios::return_on_capital,
    )
}

/// Flags a history whose newest and oldest periods both burn cash.
///
/// Free cash flow here is operating cash flow less capital expenditures, with
/// missing figures counted as zero. A single-period history compares the
/// period with itself.
#[must_use]
pub fn free_cash_flow_signal(history: &SnapshotHistory) -> FcfSignal {
    let fcf = |s: &FinancialSnapshot| {
        s.operating_cash_flow().unwrap_or(0.0) - s.capital_expenditures().unwrap_or(0.0)
    };

    if fcf(history.latest()) < 0.0 && fcf(history.oldest()) < 0.0 {
        FcfSignal::Distressed
    } else {
        FcfSignal::NotDistressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ebit_history(values: &[Option<f64>]) -> SnapshotHistory {
        let snapshots = values
            .iter()
            .map(|v| FinancialSnapshot::builder("GRW").ebit(*v).build())
            .collect();
        SnapshotHistory::new("GRW", snapshots).unwrap()
    }

    #[test]
    fn test_average_earnings_growth_literal_case() {
        let history = ebit_history(&[Some(120.0), Some(100.0), Some(80.0)]);
        let result = average_earnings_growth(&history);
        assert!(result.is_valid());
        assert_eq!(result.value(), Some(22.5));
        assert!((result.raw().unwrap() - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_base_pair_is_skipped() {
        let history = ebit_history(&[Some(120.0), Some(100.0), Some(0.0), Some(50.0)]);
        // pairs: 20%, skipped, -100%
        let result = average_earnings_growth(&history);
        assert_eq!(result.value(), Some(-40.0));
    }

    #[test]
    fn test_absent_base_is_skipped() {
        let history = ebit_history(&[Some(110.0), Some(100.0), None]);
        assert_eq!(average_earnings_growth(&history).value(), Some(10.0));
    }

    #[test]
    fn test_no_valid_pairs_is_invalid() {
        let history = ebit_history(&[Some(10.0), Some(0.0), Some(0.0)]);
        let result = average_earnings_growth(&history);
        assert_eq!(result.reason(), Some(&InvalidReason::NoValidTerms));
        assert_eq!(result.value_or(0.0), 0.0);
    }

    #[test]
    fn test_single_period_is_insufficient() {
        let history = ebit_history(&[Some(10.0)]);
        assert_eq!(
            average_earnings_growth(&history).reason(),
            Some(&InvalidReason::InsufficientHistory {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_average_fcf_growth() {
        let snapshots = vec![
            FinancialSnapshot::builder("FCF")
                .operating_cash_flow(150.0)
                .capital_expenditures(30.0)
                .build(),
            FinancialSnapshot::builder("FCF")
                .operating_cash_flow(100.0)
                .build(),
        ];
        let history = SnapshotHistory::new("FCF", snapshots).unwrap();
        assert_eq!(average_fcf_growth(&history).value(), Some(20.0));
    }

    #[test]
    fn test_average_return_is_not_a_growth_rate() {
        let snapshots = vec![
            FinancialSnapshot::builder("ROA")
                .net_income(20.0)
                .total_assets(100.0)
                .build(),
            FinancialSnapshot::builder("ROA")
                .net_income(10.0)
                .total_assets(100.0)
                .build(),
        ];
        let history = SnapshotHistory::new("ROA", snapshots).unwrap();
        // mean of 0.2 and 0.1, not the 100% growth between them
        let result = average_return_on_assets(&history);
        assert!((result.raw().unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(result.value(), Some(0.15));
    }

    #[test]
    fn test_average_return_skips_undefined_periods() {
        let snapshots = vec![
            FinancialSnapshot::builder("ROE")
                .net_income(30.0)
                .stockholders_equity(100.0)
                .build(),
            FinancialSnapshot::builder("ROE").net_income(30.0).build(),
        ];
        let history = SnapshotHistory::new("ROE", snapshots).unwrap();
        assert_eq!(average_return_on_equity(&history).value(), Some(0.3));

        let empty = SnapshotHistory::from_snapshot(FinancialSnapshot::builder("ROE").build());
        assert_eq!(
            average_return_on_equity(&empty).reason(),
            Some(&InvalidReason::NoValidTerms)
        );
    }

    #[test]
    fn test_average_return_on_capital_single_period() {
        let snapshot = FinancialSnapshot::builder("ROC")
            .ebit(30.0)
            .current_assets(100.0)
            .current_liabilities(50.0)
            .property_plant_equipment(50.0)
            .build();
        let history = SnapshotHistory::from_snapshot(snapshot);
        assert_eq!(average_return_on_capital(&history).value(), Some(0.3));
    }

    #[test]
    fn test_free_cash_flow_signal() {
        let cash_flow = |ocf: f64, capex: f64| {
            FinancialSnapshot::builder("SIG")
                .operating_cash_flow(ocf)
                .capital_expenditures(capex)
                .build()
        };

        let distressed = SnapshotHistory::new(
            "SIG",
            vec![cash_flow(10.0, 20.0), cash_flow(50.0, 10.0), cash_flow(5.0, 8.0)],
        )
        .unwrap();
        assert_eq!(free_cash_flow_signal(&distressed), FcfSignal::Distressed);

        let recovering = SnapshotHistory::new(
            "SIG",
            vec![cash_flow(30.0, 20.0), cash_flow(5.0, 8.0)],
        )
        .unwrap();
        assert_eq!(
            free_cash_flow_signal(&recovering),
            FcfSignal::NotDistressed
        );

        let unreported = SnapshotHistory::from_snapshot(FinancialSnapshot::builder("SIG").build());
        assert!(!free_cash_flow_signal(&unreported).is_distressed());
    }
}
