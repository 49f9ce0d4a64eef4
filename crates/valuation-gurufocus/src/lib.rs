#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};
use valuation_core::{
    DataProvider, DiscountRateProvider, PeriodType, Result, Symbol, ValuationError,
};

/// GuruFocus term page base URL.
const GURUFOCUS_TERM_URL: &str = "https://www.gurufocus.com/term/wacc";

/// First decimal percentage on the page.
const PERCENTAGE_PATTERN: &str = r"[0-9]+\.[0-9]+%";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// GuruFocus WACC provider.
#[derive(Debug, Clone)]
pub struct GuruFocusProvider {
    client: reqwest::Client,
}

impl GuruFocusProvider {
    /// Create a provider with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Create a provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn page_url(symbol: &Symbol) -> String {
        format!(
            "{GURUFOCUS_TERM_URL}/{ticker}/WACC-Percentage/{ticker}",
            ticker = symbol.as_str()
        )
    }

    async fn fetch_page(&self, symbol: &Symbol) -> Result<String> {
        let url = Self::page_url(symbol);
        debug!("Fetching GuruFocus page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ValuationError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ValuationError::RateLimited {
                provider: "GuruFocus".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            return Err(ValuationError::RateUnavailable {
                symbol: symbol.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ValuationError::Network(e.to_string()))
    }
}

impl Default for GuruFocusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for GuruFocusProvider {
    fn name(&self) -> &str {
        "GuruFocus"
    }

    fn description(&self) -> &str {
        "GuruFocus published weighted average cost of capital"
    }

    fn supported_periods(&self) -> &[PeriodType] {
        &[]
    }
}

#[async_trait]
impl DiscountRateProvider for GuruFocusProvider {
    #[instrument(skip(self), fields(provider = "gurufocus"))]
    async fn fetch_discount_rate(&self, symbol: &Symbol) -> Result<f64> {
        let html = self.fetch_page(symbol).await?;
        let rate = parse_wacc_percentage(&html).ok_or_else(|| ValuationError::RateUnavailable {
            symbol: symbol.to_string(),
            reason: "no WACC percentage found on the GuruFocus page".to_string(),
        })?;
        debug!(symbol = %symbol, rate, "GuruFocus WACC");
        Ok(rate)
    }
}

/// Extracts the first `NN.NN%` figure in `html` as a fraction.
///
/// `"WACC: 8.52%"` yields `0.0852`.
#[must_use]
pub fn parse_wacc_percentage(html: &str) -> Option<f64> {
    let pattern = Regex::new(PERCENTAGE_PATTERN).ok()?;
    let matched = pattern.find(html)?.as_str();
    let percent: f64 = matched.trim_end_matches('%').parse().ok()?;
    Some(percent / 100.0)
}
