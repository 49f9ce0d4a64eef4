#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/valuation/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance snapshot provider.
//!
//! Implements [`DataProvider`] and [`FundamentalSnapshotProvider`] from
//! `valuation-core` on top of Yahoo Finance's quote summary API.
//!
//! # Features
//!
//! - Annual and quarterly income statement, balance sheet and cash flow
//! - Market cap, price and share count merged onto the latest period
//! - Built-in rate limiting (1 request per second by default)
//!
//! # Example
//!
//! ```no_run
//! use valuation_yahoo::YahooProvider;
//! use valuation_core::{FundamentalSnapshotProvider, PeriodType, Symbol};
//!
//! # async fn example() -> valuation_core::Result<()> {
//! let provider = YahooProvider::new();
//! let history = provider
//!     .fetch_history(&Symbol::new("AAPL"), PeriodType::Annual, 4)
//!     .await?;
//! println!("Fetched {} periods", history.len());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, instrument};
use valuation_core::{
    DataProvider, FinancialSnapshot, FundamentalSnapshotProvider, PeriodType, Result,
    SnapshotHistory, Symbol, ValuationError, ensure_periods,
};

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`] and [`FundamentalSnapshotProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// Build the quote summary URL for the statements of one period type.
    fn build_summary_url(&self, symbol: &Symbol, period_type: PeriodType) -> String {
        let statements = match period_type {
            PeriodType::Annual => {
                "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory"
            }
            PeriodType::Quarterly => {
                "incomeStatementHistoryQuarterly,balanceSheetHistoryQuarterly,cashflowStatementHistoryQuarterly"
            }
        };

        format!(
            "{}/{}?modules={},price,defaultKeyStatistics",
            QUOTE_SUMMARY_URL,
            symbol.as_str(),
            statements
        )
    }

    /// Fetch quote summary data for a symbol.
    async fn fetch_quote_summary(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
    ) -> Result<QuoteSummaryResponse> {
        self.apply_rate_limit().await;

        let url = self.build_summary_url(symbol, period_type);
        debug!("Fetching quote summary: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ValuationError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ValuationError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ValuationError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(ValuationError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        response
            .json::<QuoteSummaryResponse>()
            .await
            .map_err(|e| ValuationError::Parse(e.to_string()))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance financial statements and market data"
    }

    fn supported_periods(&self) -> &[PeriodType] {
        &[PeriodType::Annual, PeriodType::Quarterly]
    }
}

#[async_trait]
impl FundamentalSnapshotProvider for YahooProvider {
    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<SnapshotHistory> {
        ensure_periods(periods)?;
        let response = self.fetch_quote_summary(symbol, period_type).await?;
        parse_quote_summary(symbol, period_type, periods, response)
    }
}

/// Turn a quote summary into a snapshot history, newest period first.
fn parse_quote_summary(
    symbol: &Symbol,
    period_type: PeriodType,
    periods: usize,
    response: QuoteSummaryResponse,
) -> Result<SnapshotHistory> {
    if let Some(error) = response.quote_summary.error {
        if error.code == "Not Found" {
            return Err(ValuationError::SymbolNotFound(symbol.to_string()));
        }
        return Err(ValuationError::Other(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let data = response
        .quote_summary
        .result
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| ValuationError::SymbolNotFound(symbol.to_string()))?;

    let (income, balance, cash_flow) = match period_type {
        PeriodType::Annual => (
            data.income_statement_history,
            data.balance_sheet_history,
            data.cashflow_statement_history,
        ),
        PeriodType::Quarterly => (
            data.income_statement_history_quarterly,
            data.balance_sheet_history_quarterly,
            data.cashflow_statement_history_quarterly,
        ),
    };

    let income = income.map(|m| m.income_statement_history).unwrap_or_default();
    let balance = balance.map(|m| m.balance_sheet_statements).unwrap_or_default();
    let cash_flow = cash_flow.map(|m| m.cashflow_statements).unwrap_or_default();

    let count = income.len().max(balance.len()).max(cash_flow.len()).min(periods);
    if count == 0 {
        return Err(ValuationError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("Yahoo Finance returned no {period_type} statements"),
        });
    }

    let price = data.price.unwrap_or_default();
    let statistics = data.default_key_statistics.unwrap_or_default();

    let snapshots = (0..count)
        .map(|index| {
            let is = income.get(index).cloned().unwrap_or_default();
            let bs = balance.get(index).cloned().unwrap_or_default();
            let cf = cash_flow.get(index).cloned().unwrap_or_default();

            let period_end = is
                .end_date
                .or(bs.end_date)
                .or(cf.end_date)
                .and_then(|v| v.raw)
                .and_then(timestamp_to_date);

            let builder = FinancialSnapshot::builder(symbol.clone())
                .period_type(period_type)
                .period_end(period_end)
                .revenue(raw(is.total_revenue))
                .ebit(raw(is.ebit))
                .net_income(raw(is.net_income))
                .interest_expense(raw(is.interest_expense))
                .income_tax_expense(raw(is.income_tax_expense))
                .cash_and_equivalents(raw(bs.cash))
                .current_assets(raw(bs.total_current_assets))
                .current_liabilities(raw(bs.total_current_liabilities))
                .net_receivables(raw(bs.net_receivables))
                .inventory(raw(bs.inventory))
                .property_plant_equipment(raw(bs.property_plant_equipment))
                .total_assets(raw(bs.total_assets))
                .total_liabilities(raw(bs.total_liab))
                .long_term_debt(raw(bs.long_term_debt))
                .stockholders_equity(raw(bs.total_stockholder_equity))
                .minority_interest(raw(bs.minority_interest))
                .operating_cash_flow(raw(cf.total_cash_from_operating_activities))
                .capital_expenditures(raw(cf.capital_expenditures));

            // Market data describes today, so it belongs to the newest period only.
            if index == 0 {
                builder
                    .market_cap(raw(price.market_cap))
                    .price(raw(price.regular_market_price))
                    .shares_outstanding(raw(statistics.shares_outstanding))
                    .build()
            } else {
                builder.build()
            }
        })
        .collect();

    debug!(symbol = %symbol, count, "parsed Yahoo Finance statements");
    SnapshotHistory::new(symbol.clone(), snapshots)
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw)
}

fn timestamp_to_date(timestamp: f64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp as i64, 0).map(|dt| dt.date_naive())
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    income_statement_history: Option<IncomeModule>,
    income_statement_history_quarterly: Option<IncomeModule>,
    balance_sheet_history: Option<BalanceModule>,
    balance_sheet_history_quarterly: Option<BalanceModule>,
    cashflow_statement_history: Option<CashFlowModule>,
    cashflow_statement_history_quarterly: Option<CashFlowModule>,
    price: Option<PriceModule>,
    default_key_statistics: Option<KeyStatistics>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeModule {
    #[serde(default)]
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceModule {
    #[serde(default)]
    balance_sheet_statements: Vec<BalanceSheet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashFlowModule {
    #[serde(default)]
    cashflow_statements: Vec<CashFlowStatement>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatement {
    end_date: Option<RawValue>,
    total_revenue: Option<RawValue>,
    ebit: Option<RawValue>,
    net_income: Option<RawValue>,
    interest_expense: Option<RawValue>,
    income_tax_expense: Option<RawValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheet {
    end_date: Option<RawValue>,
    cash: Option<RawValue>,
    total_current_assets: Option<RawValue>,
    total_current_liabilities: Option<RawValue>,
    net_receivables: Option<RawValue>,
    inventory: Option<RawValue>,
    property_plant_equipment: Option<RawValue>,
    total_assets: Option<RawValue>,
    total_liab: Option<RawValue>,
    long_term_debt: Option<RawValue>,
    total_stockholder_equity: Option<RawValue>,
    minority_interest: Option<RawValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashFlowStatement {
    end_date: Option<RawValue>,
    total_cash_from_operating_activities: Option<RawValue>,
    capital_expenditures: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    market_cap: Option<RawValue>,
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    shares_outstanding: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "quoteSummary": {
            "result": [{
                "incomeStatementHistory": {
                    "incomeStatementHistory": [
                        {
                            "endDate": {"raw": 1703980800, "fmt": "2023-12-31"},
                            "totalRevenue": {"raw": 1000.0},
                            "ebit": {"raw": 120.0},
                            "netIncome": {"raw": 80.0},
                            "interestExpense": {"raw": -10.0},
                            "incomeTaxExpense": {"raw": 20.0}
                        },
                        {
                            "endDate": {"raw": 1672444800, "fmt": "2022-12-31"},
                            "totalRevenue": {"raw": 900.0},
                            "ebit": {"raw": 100.0},
                            "netIncome": {"raw": 70.0}
                        }
                    ]
                },
                "balanceSheetHistory": {
                    "balanceSheetStatements": [
                        {
                            "cash": {"raw": 50.0},
                            "totalCurrentAssets": {"raw": 400.0},
                            "totalLiab": {"raw": 600.0},
                            "longTermDebt": {"raw": 200.0},
                            "totalStockholderEquity": {"raw": 500.0}
                        },
                        {
                            "totalStockholderEquity": {"raw": 450.0}
                        }
                    ]
                },
                "cashflowStatementHistory": {
                    "cashflowStatements": [
                        {
                            "totalCashFromOperatingActivities": {"raw": 150.0},
                            "capitalExpenditures": {"raw": -40.0}
                        }
                    ]
                },
                "price": {
                    "marketCap": {"raw": 2000.0},
                    "regularMarketPrice": {"raw": 20.0, "fmt": "20.00"}
                },
                "defaultKeyStatistics": {
                    "sharesOutstanding": {"raw": 100.0}
                }
            }],
            "error": null
        }
    }"#;

    fn fixture() -> QuoteSummaryResponse {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_build_summary_url() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("AAPL");

        let annual = provider.build_summary_url(&symbol, PeriodType::Annual);
        assert!(annual.contains("AAPL"));
        assert!(annual.contains("balanceSheetHistory,"));
        assert!(annual.contains("price,defaultKeyStatistics"));

        let quarterly = provider.build_summary_url(&symbol, PeriodType::Quarterly);
        assert!(quarterly.contains("balanceSheetHistoryQuarterly"));
    }

    #[test]
    fn test_parse_quote_summary() {
        let symbol = Symbol::new("ACME");
        let history = parse_quote_summary(&symbol, PeriodType::Annual, 4, fixture()).unwrap();

        assert_eq!(history.len(), 2);
        let latest = history.latest();
        assert_eq!(latest.ebit(), Some(120.0));
        assert_eq!(latest.total_liabilities(), Some(600.0));
        assert_eq!(latest.capital_expenditures(), Some(40.0));
        assert_eq!(latest.free_cash_flow(), Some(110.0));
        assert_eq!(latest.market_cap(), Some(2000.0));
        assert_eq!(latest.price(), Some(20.0));
        assert_eq!(latest.shares_outstanding(), Some(100.0));
        assert_eq!(latest.period_end(), NaiveDate::from_ymd_opt(2023, 12, 31));

        let oldest = history.oldest();
        assert_eq!(oldest.ebit(), Some(100.0));
        assert_eq!(oldest.stockholders_equity(), Some(450.0));
        assert_eq!(oldest.market_cap(), None);
        assert_eq!(oldest.operating_cash_flow(), None);
    }

    #[test]
    fn test_parse_truncates_to_requested_periods() {
        let symbol = Symbol::new("ACME");
        let history = parse_quote_summary(&symbol, PeriodType::Annual, 1, fixture()).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_parse_missing_quarterly_statements() {
        let symbol = Symbol::new("ACME");
        let err = parse_quote_summary(&symbol, PeriodType::Quarterly, 4, fixture()).unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_parse_api_error() {
        let json = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found", "description": "No fundamentals data found"}}}"#;
        let response: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        let err = parse_quote_summary(&Symbol::new("NOPE"), PeriodType::Annual, 4, response)
            .unwrap_err();
        assert!(matches!(err, ValuationError::SymbolNotFound(_)));
    }

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::new();

        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(provider.supported_periods().contains(&PeriodType::Annual));
        assert!(provider.supports_period(PeriodType::Quarterly));
    }

    #[test]
    fn test_default() {
        let provider = YahooProvider::default();
        assert_eq!(provider.name(), "Yahoo Finance");
    }
}
