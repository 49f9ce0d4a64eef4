#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for fundamental valuation.
//!
//! This crate provides the foundational abstractions shared by the engine and
//! the data sources:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`FundamentalSnapshotProvider`](provider::FundamentalSnapshotProvider) - Financial statement snapshots
//! - [`DiscountRateProvider`](provider::DiscountRateProvider) - Externally published cost of capital
//! - [`FinancialSnapshot`](types::FinancialSnapshot) / [`SnapshotHistory`](types::SnapshotHistory) - Accounting figures

/// Error types for data operations.
pub mod error;
/// Reporting period definitions.
pub mod frequency;
/// Provider traits for fetching accounting data.
pub mod provider;
/// Core data types (Symbol, FinancialSnapshot, SnapshotHistory).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{Result, ValuationError};
pub use frequency::PeriodType;
pub use provider::{
    DataProvider, DiscountRateProvider, FundamentalSnapshotProvider, ensure_periods,
};
pub use types::{FinancialSnapshot, FinancialSnapshotBuilder, SnapshotHistory, Symbol};
