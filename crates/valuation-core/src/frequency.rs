//! Reporting period definitions.
//!
//! This module defines [`PeriodType`], the granularity of the financial
//! statements a snapshot history is built from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Quarterly => write!(f, "quarterly"),
        }
    }
}
