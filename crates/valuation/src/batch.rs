//! CSV batch valuation.
//!
//! Reads tickers from a CSV file, values each one and writes a results CSV
//! with one row per ticker. A ticker that fails is logged and written as a
//! row of nulls so the output always lines up with the input.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, instrument, warn};

use valuation_core::{Result, Symbol, ValuationError};
use valuation_engine::{MetricResult, MetricsReport, ValuationEngine};

use crate::analysis::{AnalysisOptions, analyze_symbol};
use crate::registry::ProviderRegistry;

/// Input column names accepted for tickers, in order of preference.
pub const TICKER_COLUMNS: &[&str] = &["symbol", "ticker"];

/// Columns written to the results file.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "ticker",
    "niev",
    "net_margin",
    "cash",
    "roa",
    "adj_growth",
    "avg_roc",
    "wacc",
    "dcf",
    "future_price",
    "current_price",
    "growth",
];

/// Outcome of valuing one ticker in a batch.
#[derive(Debug)]
pub struct BatchRow {
    /// The ticker.
    pub symbol: Symbol,
    /// The report, or the error that prevented it.
    pub outcome: Result<MetricsReport>,
}

/// Summary of a completed batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Where the results were written.
    pub output: PathBuf,
    /// Tickers read from the input.
    pub total: usize,
    /// Tickers that could not be valued.
    pub failed: Vec<Symbol>,
}

impl BatchSummary {
    /// Tickers that were valued.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.total - self.failed.len()
    }
}

fn polars_error(e: PolarsError) -> ValuationError {
    ValuationError::Parse(e.to_string())
}

/// Default results path: `<input stem>_valuation.csv` next to the input.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    input.with_file_name(format!("{stem}_valuation.csv"))
}

/// Reads tickers from the `symbol` (or `ticker`) column of a CSV file.
///
/// Blank cells are skipped.
///
/// # Errors
///
/// Fails when the file cannot be read or has no ticker column.
pub fn read_tickers(path: &Path) -> Result<Vec<Symbol>> {
    if !path.exists() {
        return Err(ValuationError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(polars_error)?
        .finish()
        .map_err(polars_error)?;

    let name = TICKER_COLUMNS
        .iter()
        .find(|name| df.column(name).is_ok())
        .ok_or_else(|| {
            ValuationError::InvalidParameter(format!(
                "{} has no {} column",
                path.display(),
                TICKER_COLUMNS.join(" or ")
            ))
        })?;

    let column = df
        .column(name)
        .map_err(polars_error)?
        .cast(&DataType::String)
        .map_err(polars_error)?;
    let values = column.str().map_err(polars_error)?;

    Ok(values
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect())
}

/// Values every ticker in order. Failures are kept per row.
#[instrument(skip(registry, engine, symbols, options), fields(count = symbols.len()))]
pub async fn analyze_batch(
    registry: &ProviderRegistry,
    engine: &ValuationEngine,
    symbols: &[Symbol],
    options: &AnalysisOptions,
) -> Vec<BatchRow> {
    let mut rows = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let outcome = analyze_symbol(registry, engine, symbol, options).await;
        if let Err(e) = &outcome {
            warn!(symbol = %symbol, error = %e, "skipping ticker");
        }
        rows.push(BatchRow {
            symbol: symbol.clone(),
            outcome,
        });
    }
    rows
}

fn metric_column(
    rows: &[BatchRow],
    metric: impl Fn(&MetricsReport) -> &MetricResult,
) -> Vec<Option<f64>> {
    rows.iter()
        .map(|row| row.outcome.as_ref().ok().and_then(|r| metric(r).value()))
        .collect()
}

/// Lays batch rows out in the results table.
///
/// # Errors
///
/// Fails only if polars rejects the frame.
pub fn rows_to_frame(rows: &[BatchRow]) -> Result<DataFrame> {
    let tickers: Vec<String> = rows.iter().map(|row| row.symbol.to_string()).collect();

    DataFrame::new(vec![
        Column::new("ticker".into(), tickers),
        Column::new("niev".into(), metric_column(rows, |r| &r.net_income_to_ev)),
        Column::new("net_margin".into(), metric_column(rows, |r| &r.net_margin)),
        Column::new("cash".into(), metric_column(rows, |r| &r.cash_ratio)),
        Column::new("roa".into(), metric_column(rows, |r| &r.average_return_on_assets)),
        Column::new(
            "adj_growth".into(),
            metric_column(rows, |r| &r.dcf.adjusted_growth_rate),
        ),
        Column::new(
            "avg_roc".into(),
            metric_column(rows, |r| &r.average_return_on_capital),
        ),
        Column::new("wacc".into(), metric_column(rows, |r| &r.discount_rate.rate)),
        Column::new("dcf".into(), metric_column(rows, |r| &r.dcf.total_intrinsic_value)),
        Column::new("future_price".into(), metric_column(rows, |r| &r.dcf.value_per_share)),
        Column::new("current_price".into(), metric_column(rows, |r| &r.dcf.current_price)),
        Column::new(
            "growth".into(),
            metric_column(rows, |r| &r.dcf.implied_growth_percent),
        ),
    ])
    .map_err(polars_error)
}

/// Writes `frame` as CSV with a header row.
///
/// # Errors
///
/// Fails when the file cannot be created or written.
pub fn write_frame(path: &Path, frame: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|e| ValuationError::Other(e.to_string()))
}

/// Reads tickers from `input`, values them and writes the results.
///
/// # Errors
///
/// Fails when the input cannot be read or the output cannot be written.
/// Individual tickers that fail do not fail the batch.
#[instrument(skip(registry, engine, options))]
pub async fn run_batch(
    registry: &ProviderRegistry,
    engine: &ValuationEngine,
    input: &Path,
    output: Option<&Path>,
    options: &AnalysisOptions,
) -> Result<BatchSummary> {
    let symbols = read_tickers(input)?;
    let rows = analyze_batch(registry, engine, &symbols, options).await;

    let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    let mut frame = rows_to_frame(&rows)?;
    write_frame(&output, &mut frame)?;

    let failed: Vec<Symbol> = rows
        .iter()
        .filter(|row| row.outcome.is_err())
        .map(|row| row.symbol.clone())
        .collect();

    info!(
        output = %output.display(),
        total = symbols.len(),
        failed = failed.len(),
        "batch complete"
    );

    Ok(BatchSummary {
        output,
        total: symbols.len(),
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::MockProvider;
    use std::sync::Arc;
    use valuation_core::{FinancialSnapshot, SnapshotHistory};
    use valuation_engine::EngineConfig;

    fn history(symbol: &str) -> SnapshotHistory {
        let period = |ebit: f64| {
            FinancialSnapshot::builder(symbol)
                .ebit(ebit)
                .net_income(ebit / 2.0)
                .revenue(ebit * 5.0)
                .market_cap(1_000.0)
                .stockholders_equity(500.0)
                .total_liabilities(300.0)
                .total_assets(800.0)
                .shares_outstanding(10.0)
                .price(12.0)
                .build()
        };
        SnapshotHistory::new(symbol, vec![period(120.0), period(100.0), period(80.0)]).unwrap()
    }

    fn registry() -> ProviderRegistry {
        let provider = Arc::new(
            MockProvider::new("mock")
                .with_history(history("AAA"))
                .with_history(history("BBB"))
                .with_rate(0.08),
        );
        let mut registry = ProviderRegistry::new();
        registry.register_snapshot(provider.clone());
        registry.register_rate(provider);
        registry
    }

    fn engine() -> ValuationEngine {
        ValuationEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_read_tickers_from_symbol_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "symbol,notes\naapl,first\n,blank\n MSFT ,second\n").unwrap();

        let tickers = read_tickers(&path).unwrap();
        assert_eq!(tickers, vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
    }

    #[test]
    fn test_read_tickers_from_ticker_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "ticker\nIBM\n").unwrap();
        assert_eq!(read_tickers(&path).unwrap(), vec![Symbol::new("IBM")]);
    }

    #[test]
    fn test_read_tickers_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            read_tickers(&missing),
            Err(ValuationError::Io(_))
        ));

        let wrong = dir.path().join("wrong.csv");
        std::fs::write(&wrong, "name\nApple\n").unwrap();
        assert!(matches!(
            read_tickers(&wrong),
            Err(ValuationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/watchlist.csv")),
            PathBuf::from("/tmp/watchlist_valuation.csv")
        );
    }

    #[tokio::test]
    async fn test_run_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        let output = dir.path().join("output.csv");
        std::fs::write(&input, "symbol\nAAA\nMISSING\nBBB\n").unwrap();

        let summary = run_batch(
            &registry(),
            &engine(),
            &input,
            Some(&output),
            &AnalysisOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed, vec![Symbol::new("MISSING")]);

        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some(OUTPUT_COLUMNS.join(",").as_str()));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("AAA,"));
        assert!(rows[1].starts_with("MISSING,"));
        assert!(rows[1].trim_start_matches("MISSING").chars().all(|c| c == ','));
    }

    #[tokio::test]
    async fn test_rows_to_frame_values() {
        let rows = analyze_batch(
            &registry(),
            &engine(),
            &[Symbol::new("AAA")],
            &AnalysisOptions::default(),
        )
        .await;
        let frame = rows_to_frame(&rows).unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.width(), OUTPUT_COLUMNS.len());

        let wacc = frame.column("wacc").unwrap().f64().unwrap();
        assert_eq!(wacc.get(0), Some(0.08));
        let margin = frame.column("net_margin").unwrap().f64().unwrap();
        assert_eq!(margin.get(0), Some(0.1));
    }
}
