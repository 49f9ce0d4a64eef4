//! Labelled metric outcomes.
//!
//! A [`MetricResult`] carries the full-precision value of a metric together
//! with a [`MetricStatus`]. Callers read the rounded reporting value through
//! [`MetricResult::value`], which is `None` whenever the metric could not be
//! computed; the raw value stays available for composing further metrics.

use serde::Serialize;
use std::fmt;

/// Number of decimal places used when reporting ratios and percentages.
pub const REPORTING_PRECISION: u32 = 2;

/// Unit a metric is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Dimensionless ratio (0.05 = 5%).
    Ratio,
    /// Percentage points (22.5 = 22.5%).
    Percent,
    /// Amount in the reporting currency.
    Currency,
}

/// Identifies which metric a [`MetricResult`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Market cap over net current asset value.
    NetNet,
    /// Market cap over stockholders' equity.
    MarketCapToEquity,
    /// Stockholders' equity over total liabilities.
    EquityToDebt,
    /// EBIT over enterprise value.
    EarningsYield,
    /// Net income over total assets.
    ReturnOnAssets,
    /// Net income over stockholders' equity.
    ReturnOnEquity,
    /// EBIT over capital employed.
    ReturnOnCapital,
    /// Net income over enterprise value.
    NetIncomeToEv,
    /// Net income over revenue.
    NetMargin,
    /// Cash over current liabilities.
    CashRatio,
    /// Mean period-over-period EBIT growth, in percent.
    AverageEarningsGrowth,
    /// Mean period-over-period free cash flow growth, in percent.
    AverageFcfGrowth,
    /// Mean return on assets across the history.
    AverageReturnOnAssets,
    /// Mean return on equity across the history.
    AverageReturnOnEquity,
    /// Mean return on capital across the history.
    AverageReturnOnCapital,
    /// Interest expense over long-term debt.
    CostOfDebt,
    /// Income tax expense over EBIT, clamped to `[0, 1]`.
    EffectiveTaxRate,
    /// Weighted average cost of capital.
    Wacc,
    /// Rate used to discount projected cash flows.
    DiscountRate,
    /// Earnings growth after the conservatism markdown.
    AdjustedGrowthRate,
    /// Terminal growth rate after the discount-rate guard.
    TerminalGrowthRate,
    /// Cash flow at the end of the explicit horizon.
    ProjectedCashFlow,
    /// Value of cash flows beyond the horizon.
    TerminalValue,
    /// Projected cash flow plus terminal value, less liabilities and minority interest.
    IntrinsicValue,
    /// Intrinsic value per share.
    ValuePerShare,
    /// Current market price per share.
    CurrentPrice,
    /// Percentage gap between intrinsic value per share and the current price.
    ImpliedGrowth,
}

impl MetricKind {
    /// Human-readable label used in text output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NetNet => "net ratio",
            Self::MarketCapToEquity => "market cap to equity",
            Self::EquityToDebt => "equity to debt",
            Self::EarningsYield => "earnings yield",
            Self::ReturnOnAssets => "return on assets",
            Self::ReturnOnEquity => "return on equity",
            Self::ReturnOnCapital => "return on capital",
            Self::NetIncomeToEv => "net income to ev",
            Self::NetMargin => "net margin",
            Self::CashRatio => "cash ratio",
            Self::AverageEarningsGrowth => "avg earnings growth",
            Self::AverageFcfGrowth => "avg fcf growth",
            Self::AverageReturnOnAssets => "avg return on assets",
            Self::AverageReturnOnEquity => "avg return on equity",
            Self::AverageReturnOnCapital => "avg return on capital",
            Self::CostOfDebt => "cost of debt",
            Self::EffectiveTaxRate => "effective tax rate",
            Self::Wacc => "wacc",
            Self::DiscountRate => "discount rate",
            Self::AdjustedGrowthRate => "adjusted growth",
            Self::TerminalGrowthRate => "terminal growth",
            Self::ProjectedCashFlow => "projected cash flow",
            Self::TerminalValue => "terminal value",
            Self::IntrinsicValue => "intrinsic value",
            Self::ValuePerShare => "future price per share",
            Self::CurrentPrice => "current price per share",
            Self::ImpliedGrowth => "implied growth",
        }
    }

    /// Unit the metric is expressed in.
    #[must_use]
    pub const fn unit(&self) -> MetricUnit {
        match self {
            Self::AverageEarningsGrowth | Self::AverageFcfGrowth | Self::ImpliedGrowth => {
                MetricUnit::Percent
            }
            Self::ProjectedCashFlow
            | Self::TerminalValue
            | Self::IntrinsicValue
            | Self::ValuePerShare
            | Self::CurrentPrice => MetricUnit::Currency,
            _ => MetricUnit::Ratio,
        }
    }

    /// Decimal places applied by [`MetricResult::value`], if any.
    ///
    /// Aggregate currency amounts are reported at full precision; everything
    /// else, per-share prices included, is rounded to two places.
    #[must_use]
    pub const fn precision(&self) -> Option<u32> {
        match self {
            Self::ProjectedCashFlow | Self::TerminalValue | Self::IntrinsicValue => None,
            _ => Some(REPORTING_PRECISION),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a metric could not be computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidReason {
    /// A figure used as a denominator was not reported.
    MissingInput {
        /// The absent figure.
        field: &'static str,
    },
    /// A denominator evaluated to zero.
    ZeroDenominator {
        /// The zero-valued figure.
        field: &'static str,
    },
    /// A denominator that must be positive was zero or negative.
    NonPositiveDenominator {
        /// The offending figure.
        field: &'static str,
    },
    /// The computation produced NaN or infinity.
    NonFinite,
    /// The history is too short for the computation.
    InsufficientHistory {
        /// Periods needed.
        required: usize,
        /// Periods supplied.
        available: usize,
    },
    /// Every term of an average had to be skipped.
    NoValidTerms,
    /// A metric this one depends on was itself invalid.
    Unavailable {
        /// The invalid upstream input.
        input: &'static str,
    },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { field } => write!(f, "{field} not reported"),
            Self::ZeroDenominator { field } => write!(f, "{field} is zero"),
            Self::NonPositiveDenominator { field } => write!(f, "{field} is not positive"),
            Self::NonFinite => write!(f, "result is not finite"),
            Self::InsufficientHistory {
                required,
                available,
            } => write!(f, "needs {required} periods, got {available}"),
            Self::NoValidTerms => write!(f, "no period could be used"),
            Self::Unavailable { input } => write!(f, "{input} unavailable"),
        }
    }
}

/// Whether a metric was computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricStatus {
    /// The value is meaningful.
    Valid,
    /// The value is undefined.
    Invalid(InvalidReason),
}

/// A labelled metric value with an explicit validity flag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricResult {
    kind: MetricKind,
    raw: f64,
    #[serde(flatten)]
    status: MetricStatus,
}

impl MetricResult {
    /// Creates a computed result. Non-finite values are recorded as invalid.
    #[must_use]
    pub fn valid(kind: MetricKind, raw: f64) -> Self {
        if raw.is_finite() {
            Self {
                kind,
                raw,
                status: MetricStatus::Valid,
            }
        } else {
            Self::invalid(kind, InvalidReason::NonFinite)
        }
    }

    /// Creates an undefined result. The internal value is zero.
    #[must_use]
    pub const fn invalid(kind: MetricKind, reason: InvalidReason) -> Self {
        Self {
            kind,
            raw: 0.0,
            status: MetricStatus::Invalid(reason),
        }
    }

    /// Divides `numerator` by a reported denominator.
    ///
    /// The result is invalid when the denominator is absent or zero, or the
    /// quotient is not finite.
    #[must_use]
    pub fn quotient(
        kind: MetricKind,
        numerator: f64,
        denominator: Option<f64>,
        field: &'static str,
    ) -> Self {
        match denominator {
            None => Self::invalid(kind, InvalidReason::MissingInput { field }),
            Some(d) if d == 0.0 => Self::invalid(kind, InvalidReason::ZeroDenominator { field }),
            Some(d) => Self::valid(kind, numerator / d),
        }
    }

    /// Like [`MetricResult::quotient`] but also rejects negative denominators.
    #[must_use]
    pub fn positive_quotient(
        kind: MetricKind,
        numerator: f64,
        denominator: Option<f64>,
        field: &'static str,
    ) -> Self {
        match denominator {
            Some(d) if d <= 0.0 => {
                Self::invalid(kind, InvalidReason::NonPositiveDenominator { field })
            }
            other => Self::quotient(kind, numerator, other, field),
        }
    }

    /// Which metric this is.
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Unit of the value.
    #[must_use]
    pub const fn unit(&self) -> MetricUnit {
        self.kind.unit()
    }

    /// Validity of the value.
    #[must_use]
    pub const fn status(&self) -> &MetricStatus {
        &self.status
    }

    /// Returns true if the metric was computed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.status, MetricStatus::Valid)
    }

    /// Why the metric is undefined, if it is.
    #[must_use]
    pub const fn reason(&self) -> Option<&InvalidReason> {
        match &self.status {
            MetricStatus::Valid => None,
            MetricStatus::Invalid(reason) => Some(reason),
        }
    }

    /// Full-precision value, `None` when invalid.
    #[must_use]
    pub const fn raw(&self) -> Option<f64> {
        match self.status {
            MetricStatus::Valid => Some(self.raw),
            MetricStatus::Invalid(_) => None,
        }
    }

    /// Reporting value rounded to the metric's precision, `None` when invalid.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.raw().map(|raw| match self.kind.precision() {
            Some(places) => round_to(raw, places),
            None => raw,
        })
    }

    /// Reporting value, or `default` when invalid.
    #[must_use]
    pub fn value_or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }
}

impl fmt::Display for MetricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, self.value()) {
            (MetricStatus::Valid, Some(value)) => match self.unit() {
                MetricUnit::Percent => write!(f, "{value}%"),
                MetricUnit::Ratio | MetricUnit::Currency => write!(f, "{value}"),
            },
            (MetricStatus::Invalid(reason), _) => write!(f, "n/a ({reason})"),
            (MetricStatus::Valid, None) => write!(f, "n/a"),
        }
    }
}

/// Rounds `value` to `places` decimal places, ties to even.
///
/// Values too large to scale are returned unchanged.
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}
