//! Rendering of command results as text, JSON or a table.

use std::io::Write;

use serde::Serialize;
use valuation::{
    BatchSummary, FcfSignal, MetricResult, MetricsReport, Symbol, ValuationError, key_value_line,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Result of one ticker: either a value or the reason it failed.
#[derive(Debug, Serialize)]
pub(crate) struct TickerOutput<T> {
    pub(crate) symbol: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl<T> TickerOutput<T> {
    pub(crate) fn new(symbol: Symbol, outcome: Result<T, ValuationError>) -> Self {
        match outcome {
            Ok(value) => Self {
                symbol,
                result: Some(value),
                error: None,
            },
            Err(e) => Self {
                symbol,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub(crate) const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Value produced by `valuation metric`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum MetricValue {
    Metric(MetricResult),
    Signal { fcf_signal: FcfSignal },
}

impl MetricValue {
    fn label(&self) -> String {
        match self {
            Self::Metric(metric) => metric.kind().to_string(),
            Self::Signal { .. } => "fcf signal".to_string(),
        }
    }

    fn line(&self, symbol: &Symbol) -> String {
        match self {
            Self::Metric(metric) => key_value_line(symbol, metric),
            Self::Signal { fcf_signal } => format!("{symbol} fcf signal: {fcf_signal}"),
        }
    }

    fn cell(&self) -> String {
        match self {
            Self::Metric(metric) => metric.to_string(),
            Self::Signal { fcf_signal } => fcf_signal.to_string(),
        }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Left-aligned columns separated by two spaces.
fn write_table<W: Write>(
    out: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), CliError> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "{}", table_row(headers, &widths))?;
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(out, "{}", table_row(&cells, &widths))?;
    }
    Ok(())
}

fn table_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn error_row(symbol: &Symbol, error: &str) -> Vec<String> {
    vec![symbol.to_string(), "error".to_string(), error.to_string()]
}

/// Renders `valuation metric` results.
pub(crate) fn render_metrics<W: Write>(
    out: &mut W,
    rows: &[TickerOutput<MetricValue>],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, rows, pretty),
        OutputFormat::Text => {
            for row in rows {
                match (&row.result, &row.error) {
                    (Some(value), _) => writeln!(out, "{}", value.line(&row.symbol))?,
                    (None, error) => writeln!(
                        out,
                        "{} error: {}",
                        row.symbol,
                        error.as_deref().unwrap_or("unknown")
                    )?,
                }
            }
            Ok(())
        }
        OutputFormat::Table => {
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| match &row.result {
                    Some(value) => vec![row.symbol.to_string(), value.label(), value.cell()],
                    None => error_row(&row.symbol, row.error.as_deref().unwrap_or("unknown")),
                })
                .collect();
            write_table(out, &["TICKER", "METRIC", "VALUE"], &cells)
        }
    }
}

/// Renders `valuation report` results.
pub(crate) fn render_reports<W: Write>(
    out: &mut W,
    rows: &[TickerOutput<MetricsReport>],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, rows, pretty),
        OutputFormat::Text => {
            for row in rows {
                match &row.result {
                    Some(report) => {
                        for line in report.to_key_value_lines() {
                            writeln!(out, "{line}")?;
                        }
                    }
                    None => writeln!(
                        out,
                        "{} error: {}",
                        row.symbol,
                        row.error.as_deref().unwrap_or("unknown")
                    )?,
                }
            }
            Ok(())
        }
        OutputFormat::Table => {
            let mut cells = Vec::new();
            for row in rows {
                match &row.result {
                    Some(report) => {
                        let symbol = report.symbol.to_string();
                        cells.extend(report.metrics().into_iter().map(|metric| {
                            vec![symbol.clone(), metric.kind().to_string(), metric.to_string()]
                        }));
                        cells.push(vec![
                            symbol.clone(),
                            "fcf signal".to_string(),
                            report.fcf_signal.to_string(),
                        ]);
                        cells.push(vec![
                            symbol,
                            "discount rate source".to_string(),
                            report.discount_rate.source.to_string(),
                        ]);
                    }
                    None => cells.push(error_row(
                        &row.symbol,
                        row.error.as_deref().unwrap_or("unknown"),
                    )),
                }
            }
            write_table(out, &["TICKER", "METRIC", "VALUE"], &cells)
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchOutput<'a> {
    output: String,
    total: usize,
    succeeded: usize,
    failed: &'a [Symbol],
}

/// Renders the outcome of `valuation batch`.
pub(crate) fn render_batch<W: Write>(
    out: &mut W,
    summary: &BatchSummary,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let view = BatchOutput {
        output: summary.output.display().to_string(),
        total: summary.total,
        succeeded: summary.succeeded(),
        failed: &summary.failed,
    };

    match format {
        OutputFormat::Json => write_json(out, &view, pretty),
        OutputFormat::Text => {
            writeln!(
                out,
                "valued {} of {} tickers, results in {}",
                view.succeeded, view.total, view.output
            )?;
            if !view.failed.is_empty() {
                let failed: Vec<&str> = view.failed.iter().map(Symbol::as_str).collect();
                writeln!(out, "failed: {}", failed.join(", "))?;
            }
            Ok(())
        }
        OutputFormat::Table => {
            let failed: Vec<&str> = view.failed.iter().map(Symbol::as_str).collect();
            let rows = vec![
                vec!["output".to_string(), view.output.clone()],
                vec!["total".to_string(), view.total.to_string()],
                vec!["succeeded".to_string(), view.succeeded.to_string()],
                vec!["failed".to_string(), failed.join(" ")],
            ];
            write_table(out, &["FIELD", "VALUE"], &rows)
        }
    }
}
