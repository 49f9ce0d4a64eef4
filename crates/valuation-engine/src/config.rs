//! Engine configuration.

use serde::{Deserialize, Serialize};
use valuation_core::Result;

use crate::dcf::DcfParameters;

/// Settings shared by every computation of a [`crate::ValuationEngine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log every input figure and intermediate result at debug level.
    pub trace_inputs: bool,
    /// DCF model parameters.
    pub dcf: DcfParameters,
}

impl EngineConfig {
    /// Enables or disables input tracing.
    #[must_use]
    pub const fn with_trace_inputs(mut self, enabled: bool) -> Self {
        self.trace_inputs = enabled;
        self
    }

    /// Replaces the DCF parameters.
    #[must_use]
    pub const fn with_dcf(mut self, dcf: DcfParameters) -> Self {
        self.dcf = dcf;
        self
    }

    /// Validates every nested section.
    ///
    /// # Errors
    ///
    /// Returns [`valuation_core::ValuationError::InvalidParameter`] when a
    /// nested section is out of range.
    pub fn validate(&self) -> Result<()> {
        self.dcf.validate()
    }
}
