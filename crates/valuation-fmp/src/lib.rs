#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial Modeling Prep (FMP) snapshot provider.
//!
//! This crate implements the `valuation-core` provider traits for the
//! [Financial Modeling Prep](https://financialmodelingprep.com/) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use valuation_fmp::FmpProvider;
//! use valuation_core::{FundamentalSnapshotProvider, PeriodType, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = FmpProvider::new("your_api_key");
//!
//!     let history = provider
//!         .fetch_history(&Symbol::new("AAPL"), PeriodType::Annual, 5)
//!         .await?;
//!     println!("latest EBIT: {:?}", history.latest().ebit());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{instrument, warn};
use valuation_core::{
    DataProvider, FinancialSnapshot, FundamentalSnapshotProvider, PeriodType, Result,
    SnapshotHistory, Symbol, ValuationError, ensure_periods,
};

/// Base URL for the FMP stable API.
const FMP_BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Reporting periods FMP publishes statements for.
const SUPPORTED_PERIODS: &[PeriodType] = &[PeriodType::Annual, PeriodType::Quarterly];

/// Financial Modeling Prep data provider.
///
/// Provides access to:
/// - Income statements, balance sheets, cash flow statements
/// - Current market cap and price from the company profile
#[derive(Clone)]
pub struct FmpProvider {
    client: Client,
    api_key: String,
}

impl fmt::Debug for FmpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmpProvider")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl FmpProvider {
    /// Create a new FMP provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a new FMP provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Build a URL with the API key appended.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.contains('?') {
            format!("{FMP_BASE_URL}/{endpoint}&apikey={}", self.api_key)
        } else {
            format!("{FMP_BASE_URL}/{endpoint}?apikey={}", self.api_key)
        }
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!("FMP request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ValuationError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ValuationError::RateLimited {
                provider: "FMP".to_string(),
                retry_after: None,
            });
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ValuationError::AuthenticationFailed(
                "FMP rejected the API key".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ValuationError::Network(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ValuationError::Network(e.to_string()))?;

        // Check for FMP error responses
        if text.contains("\"Error Message\"") || text.contains("\"error\"") {
            return Err(ValuationError::Network(text));
        }

        serde_json::from_str(&text).map_err(|e| ValuationError::Parse(format!("{e}: {text}")))
    }

    /// Endpoint for one statement type.
    fn statement_endpoint(
        statement: &str,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> String {
        let period = match period_type {
            PeriodType::Annual => "annual",
            PeriodType::Quarterly => "quarter",
        };
        format!(
            "{statement}?symbol={}&period={period}&limit={limit}",
            symbol.as_str()
        )
    }

    /// Fetch income statements from FMP API.
    async fn fetch_income_statements(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<Vec<FmpIncomeStatement>> {
        self.get(&Self::statement_endpoint(
            "income-statement",
            symbol,
            period_type,
            limit,
        ))
        .await
    }

    /// Fetch balance sheets from FMP API.
    async fn fetch_balance_sheets(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<Vec<FmpBalanceSheet>> {
        self.get(&Self::statement_endpoint(
            "balance-sheet-statement",
            symbol,
            period_type,
            limit,
        ))
        .await
    }

    /// Fetch cash flow statements from FMP API.
    async fn fetch_cash_flows(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<Vec<FmpCashFlow>> {
        self.get(&Self::statement_endpoint(
            "cash-flow-statement",
            symbol,
            period_type,
            limit,
        ))
        .await
    }

    /// Fetch company profile from FMP API.
    async fn fetch_profile(&self, symbol: &Symbol) -> Result<Vec<FmpProfile>> {
        let endpoint = format!("profile?symbol={}", symbol.as_str());
        self.get(&endpoint).await
    }
}

impl DataProvider for FmpProvider {
    fn name(&self) -> &str {
        "FMP"
    }

    fn description(&self) -> &str {
        "Financial Modeling Prep - Financial statements and market data API"
    }

    fn supported_periods(&self) -> &[PeriodType] {
        SUPPORTED_PERIODS
    }
}

#[async_trait]
impl FundamentalSnapshotProvider for FmpProvider {
    #[instrument(skip(self), fields(provider = "fmp"))]
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<SnapshotHistory> {
        ensure_periods(periods)?;

        // Fetch all statement types in parallel
        let (income_result, balance_result, cash_result, profile_result) = tokio::join!(
            self.fetch_income_statements(symbol, period_type, periods),
            self.fetch_balance_sheets(symbol, period_type, periods),
            self.fetch_cash_flows(symbol, period_type, periods),
            self.fetch_profile(symbol),
        );

        let profile = match profile_result {
            Ok(profiles) => profiles.into_iter().next(),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "FMP profile unavailable, market figures omitted");
                None
            }
        };

        merge_statements(
            symbol,
            period_type,
            periods,
            &income_result?,
            &balance_result?,
            &cash_result?,
            profile.as_ref(),
        )
    }
}

/// Merge statements by period date into snapshots, newest first.
///
/// The income statement drives the periods; balance sheet and cash flow rows
/// with a matching date fill in the rest. Profile figures go on the newest
/// period only.
fn merge_statements(
    symbol: &Symbol,
    period_type: PeriodType,
    periods: usize,
    income_statements: &[FmpIncomeStatement],
    balance_sheets: &[FmpBalanceSheet],
    cash_flows: &[FmpCashFlow],
    profile: Option<&FmpProfile>,
) -> Result<SnapshotHistory> {
    let mut dated: Vec<(NaiveDate, &FmpIncomeStatement)> = income_statements
        .iter()
        .filter_map(|income| {
            NaiveDate::parse_from_str(&income.date, "%Y-%m-%d")
                .ok()
                .map(|date| (date, income))
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.truncate(periods);

    if dated.is_empty() {
        return Err(ValuationError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("FMP returned no {period_type} income statements"),
        });
    }

    let snapshots = dated
        .into_iter()
        .enumerate()
        .map(|(index, (date, income))| {
            let balance = balance_sheets.iter().find(|b| b.date == income.date);
            let cash = cash_flows.iter().find(|c| c.date == income.date);

            let mut builder = FinancialSnapshot::builder(symbol.clone())
                .period_type(period_type)
                .period_end(date)
                .revenue(income.revenue)
                .ebit(income.ebit.or(income.operating_income))
                .net_income(income.net_income)
                .interest_expense(income.interest_expense)
                .income_tax_expense(income.income_tax_expense);

            if let Some(balance) = balance {
                builder = builder
                    .cash_and_equivalents(balance.cash_and_cash_equivalents)
                    .current_assets(balance.total_current_assets)
                    .current_liabilities(balance.total_current_liabilities)
                    .net_receivables(balance.net_receivables)
                    .inventory(balance.inventory)
                    .property_plant_equipment(balance.property_plant_equipment_net)
                    .total_assets(balance.total_assets)
                    .total_liabilities(balance.total_liabilities)
                    .long_term_debt(balance.long_term_debt)
                    .stockholders_equity(balance.total_stockholders_equity)
                    .minority_interest(balance.minority_interest);
            }

            if let Some(cash) = cash {
                builder = builder
                    .operating_cash_flow(cash.operating_cash_flow)
                    .capital_expenditures(cash.capital_expenditure);
            }

            if index == 0 {
                builder = builder.shares_outstanding(income.weighted_average_shs_out);
                if let Some(profile) = profile {
                    builder = builder.market_cap(profile.market_cap).price(profile.price);
                }
            }

            builder.build()
        })
        .collect();

    SnapshotHistory::new(symbol.clone(), snapshots)
}

// ============================================================================
// FMP API Response Types
// ============================================================================

/// FMP Income Statement response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpIncomeStatement {
    date: String,
    #[serde(default)]
    revenue: Option<f64>,
    #[serde(default)]
    operating_income: Option<f64>,
    #[serde(default)]
    ebit: Option<f64>,
    #[serde(default)]
    net_income: Option<f64>,
    #[serde(default)]
    interest_expense: Option<f64>,
    #[serde(default)]
    income_tax_expense: Option<f64>,
    #[serde(default)]
    weighted_average_shs_out: Option<f64>,
}

/// FMP Balance Sheet response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpBalanceSheet {
    date: String,
    #[serde(default)]
    cash_and_cash_equivalents: Option<f64>,
    #[serde(default)]
    total_current_assets: Option<f64>,
    #[serde(default)]
    total_current_liabilities: Option<f64>,
    #[serde(default)]
    net_receivables: Option<f64>,
    #[serde(default)]
    inventory: Option<f64>,
    #[serde(default)]
    property_plant_equipment_net: Option<f64>,
    #[serde(default)]
    total_assets: Option<f64>,
    #[serde(default)]
    total_liabilities: Option<f64>,
    #[serde(default)]
    long_term_debt: Option<f64>,
    #[serde(default)]
    total_stockholders_equity: Option<f64>,
    #[serde(default)]
    minority_interest: Option<f64>,
}

/// FMP Cash Flow Statement response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpCashFlow {
    date: String,
    #[serde(default)]
    operating_cash_flow: Option<f64>,
    #[serde(default)]
    capital_expenditure: Option<f64>,
}

/// FMP Company Profile response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpProfile {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default, alias = "mktCap")]
    market_cap: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income() -> Vec<FmpIncomeStatement> {
        serde_json::from_str(
            r#"[
                {"date": "2022-12-31", "symbol": "ACME", "revenue": 900.0, "operatingIncome": 100.0, "netIncome": 60.0},
                {"date": "2023-12-31", "symbol": "ACME", "revenue": 1000.0, "ebit": 120.0, "operatingIncome": 110.0,
                 "netIncome": 80.0, "interestExpense": 10.0, "incomeTaxExpense": 20.0, "weightedAverageShsOut": 50.0},
                {"date": "not a date", "symbol": "ACME"}
            ]"#,
        )
        .unwrap()
    }

    fn balance() -> Vec<FmpBalanceSheet> {
        serde_json::from_str(
            r#"[
                {"date": "2023-12-31", "symbol": "ACME", "totalLiabilities": 600.0, "longTermDebt": 200.0,
                 "totalStockholdersEquity": 500.0, "propertyPlantEquipmentNet": 300.0, "minorityInterest": 5.0}
            ]"#,
        )
        .unwrap()
    }

    fn cash() -> Vec<FmpCashFlow> {
        serde_json::from_str(
            r#"[
                {"date": "2023-12-31", "symbol": "ACME", "operatingCashFlow": 150.0, "capitalExpenditure": -40.0}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let provider = FmpProvider::new("test_key");
        assert_eq!(
            provider.url("quote?symbol=AAPL"),
            "https://financialmodelingprep.com/stable/quote?symbol=AAPL&apikey=test_key"
        );
        assert_eq!(
            provider.url("profile"),
            "https://financialmodelingprep.com/stable/profile?apikey=test_key"
        );
    }

    #[test]
    fn test_statement_endpoint() {
        let symbol = Symbol::new("AAPL");
        assert_eq!(
            FmpProvider::statement_endpoint("income-statement", &symbol, PeriodType::Quarterly, 8),
            "income-statement?symbol=AAPL&period=quarter&limit=8"
        );
    }

    #[test]
    fn test_merge_statements() {
        let profile: FmpProfile =
            serde_json::from_str(r#"{"symbol": "ACME", "price": 20.0, "mktCap": 1000.0}"#).unwrap();
        let symbol = Symbol::new("ACME");
        let history = merge_statements(
            &symbol,
            PeriodType::Annual,
            5,
            &income(),
            &balance(),
            &cash(),
            Some(&profile),
        )
        .unwrap();

        assert_eq!(history.len(), 2);
        let latest = history.latest();
        assert_eq!(latest.period_end(), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(latest.ebit(), Some(120.0));
        assert_eq!(latest.long_term_debt(), Some(200.0));
        assert_eq!(latest.capital_expenditures(), Some(40.0));
        assert_eq!(latest.market_cap(), Some(1000.0));
        assert_eq!(latest.price(), Some(20.0));
        assert_eq!(latest.shares_outstanding(), Some(50.0));

        let oldest = history.oldest();
        assert_eq!(oldest.ebit(), Some(100.0));
        assert_eq!(oldest.total_liabilities(), None);
        assert_eq!(oldest.market_cap(), None);
    }

    #[test]
    fn test_merge_truncates_and_requires_statements() {
        let symbol = Symbol::new("ACME");
        let history =
            merge_statements(&symbol, PeriodType::Annual, 1, &income(), &[], &[], None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().net_income(), Some(80.0));

        let err = merge_statements(&symbol, PeriodType::Annual, 5, &[], &balance(), &cash(), None)
            .unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_provider_metadata() {
        let provider = FmpProvider::new("test_key");
        assert_eq!(provider.name(), "FMP");
        assert!(!provider.description().is_empty());
        assert_eq!(provider.supported_periods(), SUPPORTED_PERIODS);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = FmpProvider::new("secret_key_12345");
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
