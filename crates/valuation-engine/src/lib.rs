#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Engine configuration.
pub mod config;
/// Discounted cash flow valuation.
pub mod dcf;
/// Configured engine.
pub mod engine;
/// History-based growth and average metrics.
pub mod growth;
/// Metric results and validity.
pub mod metric;
/// Single-snapshot ratios.
pub mod ratios;
/// Full per-ticker report.
pub mod report;
/// Weighted average cost of capital.
pub mod wacc;

pub use config::EngineConfig;
pub use dcf::{DcfParameters, DcfValuation, discounted_cash_flow};
pub use engine::ValuationEngine;
pub use growth::FcfSignal;
pub use metric::{InvalidReason, MetricKind, MetricResult, MetricStatus, MetricUnit, round_to};
pub use report::{DiscountRate, DiscountRatePolicy, DiscountRateSource, MetricsReport};
pub use wacc::{WaccBreakdown, weighted_average_cost_of_capital};
