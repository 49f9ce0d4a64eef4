#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Fundamental valuation with pluggable data providers.
//!
//! This crate re-exports the core types and the metrics engine, the provider
//! implementations enabled by features, and a [`ProviderRegistry`] for
//! managing multiple providers with automatic fallback behavior.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance statement provider
//! - `fmp` - Financial Modeling Prep statement provider
//! - `gurufocus` - GuruFocus WACC discount rate provider
//!
//! # Example
//!
//! ```rust,ignore
//! use valuation::{AnalysisOptions, EngineConfig, ProviderRegistry, Symbol, ValuationEngine};
//!
//! #[tokio::main]
//! async fn main() -> valuation::Result<()> {
//!     let registry = ProviderRegistry::new().with_yahoo().with_gurufocus();
//!     let engine = ValuationEngine::new(EngineConfig::default())?;
//!
//!     let report = valuation::analyze_symbol(
//!         &registry,
//!         &engine,
//!         &Symbol::new("AAPL"),
//!         &AnalysisOptions::default(),
//!     )
//!     .await?;
//!     for line in report.to_key_value_lines() {
//!         println!("{line}");
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use valuation_core::*;

// Metrics engine
pub use valuation_engine::{
    DcfParameters, DcfValuation, DiscountRate, DiscountRatePolicy, DiscountRateSource,
    EngineConfig, FcfSignal, InvalidReason, MetricKind, MetricResult, MetricStatus, MetricUnit,
    MetricsReport, ValuationEngine, WaccBreakdown, dcf, growth, ratios, report::key_value_line,
    wacc,
};

// Providers
#[cfg(feature = "fmp")]
pub use valuation_fmp::FmpProvider;
#[cfg(feature = "gurufocus")]
pub use valuation_gurufocus::GuruFocusProvider;
#[cfg(feature = "yahoo")]
pub use valuation_yahoo::YahooProvider;

mod analysis;
mod batch;
mod registry;

pub use analysis::{AnalysisOptions, DEFAULT_PERIODS, analyze_symbol, external_rate};
pub use batch::{
    BatchRow, BatchSummary, OUTPUT_COLUMNS, TICKER_COLUMNS, analyze_batch, default_output_path,
    read_tickers, rows_to_frame, run_batch, write_frame,
};
pub use registry::ProviderRegistry;
