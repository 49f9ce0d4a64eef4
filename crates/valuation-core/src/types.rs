//! Core data types for fundamental valuation.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`FinancialSnapshot`] - Accounting figures for one reporting period
//! - [`FinancialSnapshotBuilder`] - Builder for [`FinancialSnapshot`]
//! - [`SnapshotHistory`] - Newest-first sequence of snapshots for one symbol

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValuationError};
use crate::frequency::PeriodType;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased and trimmed on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Accounting figures for one company as of one reporting period.
///
/// Every figure is optional: `None` means the source did not report the line
/// item, which is a different state from a reported zero. All amounts are in
/// the company's reporting currency. Capital expenditures are stored as a
/// positive outflow regardless of the sign convention of the source.
///
/// A snapshot cannot be modified once built; use
/// [`FinancialSnapshot::builder`] to assemble one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    symbol: Symbol,
    period_end: Option<NaiveDate>,
    period_type: PeriodType,

    // Balance sheet
    cash_and_equivalents: Option<f64>,
    current_assets: Option<f64>,
    current_liabilities: Option<f64>,
    net_receivables: Option<f64>,
    inventory: Option<f64>,
    property_plant_equipment: Option<f64>,
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    long_term_debt: Option<f64>,
    stockholders_equity: Option<f64>,
    minority_interest: Option<f64>,

    // Income and cash flow
    revenue: Option<f64>,
    net_income: Option<f64>,
    ebit: Option<f64>,
    interest_expense: Option<f64>,
    income_tax_expense: Option<f64>,
    operating_cash_flow: Option<f64>,
    capital_expenditures: Option<f64>,

    // Market
    market_cap: Option<f64>,
    shares_outstanding: Option<f64>,
    price: Option<f64>,
}

impl FinancialSnapshot {
    /// Starts building a snapshot for `symbol`.
    #[must_use]
    pub fn builder(symbol: impl Into<Symbol>) -> FinancialSnapshotBuilder {
        FinancialSnapshotBuilder::new(symbol.into())
    }

    /// Stock symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// End date of the reporting period, when the source reports one.
    #[must_use]
    pub const fn period_end(&self) -> Option<NaiveDate> {
        self.period_end
    }

    /// Type of period (annual or quarterly).
    #[must_use]
    pub const fn period_type(&self) -> PeriodType {
        self.period_type
    }

    /// Cash and cash equivalents.
    #[must_use]
    pub const fn cash_and_equivalents(&self) -> Option<f64> {
        self.cash_and_equivalents
    }

    /// Total current assets.
    #[must_use]
    pub const fn current_assets(&self) -> Option<f64> {
        self.current_assets
    }

    /// Total current liabilities.
    #[must_use]
    pub const fn current_liabilities(&self) -> Option<f64> {
        self.current_liabilities
    }

    /// Net receivables.
    #[must_use]
    pub const fn net_receivables(&self) -> Option<f64> {
        self.net_receivables
    }

    /// Inventory.
    #[must_use]
    pub const fn inventory(&self) -> Option<f64> {
        self.inventory
    }

    /// Property, plant and equipment (fixed assets).
    #[must_use]
    pub const fn property_plant_equipment(&self) -> Option<f64> {
        self.property_plant_equipment
    }

    /// Total assets.
    #[must_use]
    pub const fn total_assets(&self) -> Option<f64> {
        self.total_assets
    }

    /// Total liabilities.
    #[must_use]
    pub const fn total_liabilities(&self) -> Option<f64> {
        self.total_liabilities
    }

    /// Long-term debt.
    #[must_use]
    pub const fn long_term_debt(&self) -> Option<f64> {
        self.long_term_debt
    }

    /// Total stockholders' equity.
    #[must_use]
    pub const fn stockholders_equity(&self) -> Option<f64> {
        self.stockholders_equity
    }

    /// Minority (non-controlling) interest.
    #[must_use]
    pub const fn minority_interest(&self) -> Option<f64> {
        self.minority_interest
    }

    /// Total revenue.
    #[must_use]
    pub const fn revenue(&self) -> Option<f64> {
        self.revenue
    }

    /// Net income.
    #[must_use]
    pub const fn net_income(&self) -> Option<f64> {
        self.net_income
    }

    /// Earnings before interest and taxes.
    #[must_use]
    pub const fn ebit(&self) -> Option<f64> {
        self.ebit
    }

    /// Interest expense.
    #[must_use]
    pub const fn interest_expense(&self) -> Option<f64> {
        self.interest_expense
    }

    /// Income tax expense.
    #[must_use]
    pub const fn income_tax_expense(&self) -> Option<f64> {
        self.income_tax_expense
    }

    /// Cash flow from operating activities.
    #[must_use]
    pub const fn operating_cash_flow(&self) -> Option<f64> {
        self.operating_cash_flow
    }

    /// Capital expenditures, as a positive outflow.
    #[must_use]
    pub const fn capital_expenditures(&self) -> Option<f64> {
        self.capital_expenditures
    }

    /// Market capitalization.
    #[must_use]
    pub const fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }

    /// Shares outstanding.
    #[must_use]
    pub const fn shares_outstanding(&self) -> Option<f64> {
        self.shares_outstanding
    }

    /// Current price per share.
    #[must_use]
    pub const fn price(&self) -> Option<f64> {
        self.price
    }

    /// Free cash flow: operating cash flow less capital expenditures.
    ///
    /// Falls back to operating cash flow alone when capital expenditures are
    /// not reported. Returns `None` when operating cash flow is absent.
    #[must_use]
    pub fn free_cash_flow(&self) -> Option<f64> {
        let operating = self.operating_cash_flow?;
        Some(match self.capital_expenditures {
            Some(capex) => operating - capex,
            None => operating,
        })
    }
}

/// Builder for [`FinancialSnapshot`].
///
/// Every setter accepts either a plain `f64` or an `Option<f64>`, so provider
/// code can pass through whatever the source returned.
#[derive(Clone, Debug)]
pub struct FinancialSnapshotBuilder {
    inner: FinancialSnapshot,
}

impl FinancialSnapshotBuilder {
    fn new(symbol: Symbol) -> Self {
        Self {
            inner: FinancialSnapshot {
                symbol,
                ..Default::default()
            },
        }
    }

    /// Sets the end date of the reporting period.
    #[must_use]
    pub fn period_end(mut self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.inner.period_end = date.into();
        self
    }

    /// Sets the period type.
    #[must_use]
    pub const fn period_type(mut self, period_type: PeriodType) -> Self {
        self.inner.period_type = period_type;
        self
    }

    /// Sets cash and cash equivalents.
    #[must_use]
    pub fn cash_and_equivalents(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.cash_and_equivalents = value.into();
        self
    }

    /// Sets total current assets.
    #[must_use]
    pub fn current_assets(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.current_assets = value.into();
        self
    }

    /// Sets total current liabilities.
    #[must_use]
    pub fn current_liabilities(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.current_liabilities = value.into();
        self
    }

    /// Sets net receivables.
    #[must_use]
    pub fn net_receivables(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.net_receivables = value.into();
        self
    }

    /// Sets inventory.
    #[must_use]
    pub fn inventory(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.inventory = value.into();
        self
    }

    /// Sets property, plant and equipment.
    #[must_use]
    pub fn property_plant_equipment(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.property_plant_equipment = value.into();
        self
    }

    /// Sets total assets.
    #[must_use]
    pub fn total_assets(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.total_assets = value.into();
        self
    }

    /// Sets total liabilities.
    #[must_use]
    pub fn total_liabilities(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.total_liabilities = value.into();
        self
    }

    /// Sets long-term debt.
    #[must_use]
    pub fn long_term_debt(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.long_term_debt = value.into();
        self
    }

    /// Sets total stockholders' equity.
    #[must_use]
    pub fn stockholders_equity(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.stockholders_equity = value.into();
        self
    }

    /// Sets minority interest.
    #[must_use]
    pub fn minority_interest(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.minority_interest = value.into();
        self
    }

    /// Sets total revenue.
    #[must_use]
    pub fn revenue(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.revenue = value.into();
        self
    }

    /// Sets net income.
    #[must_use]
    pub fn net_income(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.net_income = value.into();
        self
    }

    /// Sets EBIT.
    #[must_use]
    pub fn ebit(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.ebit = value.into();
        self
    }

    /// Sets interest expense.
    #[must_use]
    pub fn interest_expense(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.interest_expense = value.into();
        self
    }

    /// Sets income tax expense.
    #[must_use]
    pub fn income_tax_expense(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.income_tax_expense = value.into();
        self
    }

    /// Sets operating cash flow.
    #[must_use]
    pub fn operating_cash_flow(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.operating_cash_flow = value.into();
        self
    }

    /// Sets capital expenditures. The sign is normalised to a positive outflow.
    #[must_use]
    pub fn capital_expenditures(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.capital_expenditures = value.into().map(f64::abs);
        self
    }

    /// Sets market capitalization.
    #[must_use]
    pub fn market_cap(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.market_cap = value.into();
        self
    }

    /// Sets shares outstanding.
    #[must_use]
    pub fn shares_outstanding(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.shares_outstanding = value.into();
        self
    }

    /// Sets the current price per share.
    #[must_use]
    pub fn price(mut self, value: impl Into<Option<f64>>) -> Self {
        self.inner.price = value.into();
        self
    }

    /// Finishes the snapshot.
    #[must_use]
    pub fn build(self) -> FinancialSnapshot {
        self.inner
    }
}

/// Snapshots for one symbol, ordered from most recent to oldest.
///
/// A history always holds at least one snapshot. Growth calculations compare
/// entry `i` with entry `i + 1`, the older period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotHistory {
    symbol: Symbol,
    snapshots: Vec<FinancialSnapshot>,
}

impl SnapshotHistory {
    /// Creates a history from snapshots already ordered newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::EmptyHistory`] when `snapshots` is empty.
    pub fn new(symbol: impl Into<Symbol>, snapshots: Vec<FinancialSnapshot>) -> Result<Self> {
        let symbol = symbol.into();
        if snapshots.is_empty() {
            return Err(ValuationError::EmptyHistory(symbol.to_string()));
        }
        Ok(Self { symbol, snapshots })
    }

    /// Creates a single-period history.
    #[must_use]
    pub fn from_snapshot(snapshot: FinancialSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol().clone(),
            snapshots: vec![snapshot],
        }
    }

    /// Symbol the history belongs to.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// The most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> &FinancialSnapshot {
        &self.snapshots[0]
    }

    /// The oldest snapshot.
    #[must_use]
    pub fn oldest(&self) -> &FinancialSnapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Returns the number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history holds at least one period.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Returns an iterator over the snapshots, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FinancialSnapshot> {
        self.snapshots.iter()
    }

    /// Returns adjacent `(newer, older)` pairs, newest pair first.
    pub fn pairs(&self) -> impl Iterator<Item = (&FinancialSnapshot, &FinancialSnapshot)> {
        self.snapshots.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Consumes the history and returns the underlying vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<FinancialSnapshot> {
        self.snapshots
    }
}

impl<'a> IntoIterator for &'a SnapshotHistory {
    type Item = &'a FinancialSnapshot;
    type IntoIter = std::slice::Iter<'a, FinancialSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
