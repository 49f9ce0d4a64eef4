//! Command-line argument definitions.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `metric` | One metric for one or more tickers |
//! | `report` | Every metric plus WACC and DCF |
//! | `batch` | Value every ticker listed in a CSV file |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--provider` | `auto` | Statement provider selection |
//! | `--period` | `annual` | Statement frequency |
//! | `--periods` | `4` | Periods of history to fetch |
//! | `--external-rate` | none | Discount rate used instead of GuruFocus |
//! | `--no-external-rate` | `false` | Skip the GuruFocus lookup |
//! | `--default-discount-rate` | none | Rate used when nothing else is available |
//! | `--config` | none | Engine settings as JSON |
//! | `--format` | `text` | Output format (text, json, table) |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use valuation::{DEFAULT_PERIODS, PeriodType};

/// Fundamental valuation metrics for listed companies.
#[derive(Debug, Parser)]
#[command(
    name = "valuation",
    author,
    version,
    about = "Fundamental valuation metrics and DCF for listed companies"
)]
pub(crate) struct Cli {
    /// Statement provider selection.
    #[arg(long, global = true, value_enum, default_value_t = ProviderSelector::Auto)]
    pub(crate) provider: ProviderSelector,

    /// Financial Modeling Prep API key.
    #[arg(long, global = true, env = "FMP_API_KEY", hide_env_values = true)]
    pub(crate) fmp_api_key: Option<String>,

    /// Statement frequency.
    #[arg(long, global = true, value_enum, default_value_t = PeriodSelector::Annual)]
    pub(crate) period: PeriodSelector,

    /// Periods of history to fetch per ticker.
    #[arg(long, global = true, default_value_t = DEFAULT_PERIODS)]
    pub(crate) periods: usize,

    /// Discount rate used instead of asking GuruFocus (e.g. 0.085).
    #[arg(long, global = true)]
    pub(crate) external_rate: Option<f64>,

    /// Do not fetch an external discount rate.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "external_rate")]
    pub(crate) no_external_rate: bool,

    /// Discount rate used when neither an external nor a computed WACC is
    /// available.
    #[arg(long, global = true)]
    pub(crate) default_discount_rate: Option<f64>,

    /// Engine settings file (JSON).
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) pretty: bool,

    /// Debug logging and per-figure input tracing.
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// `TICKER label: value` lines.
    Text,
    /// Single JSON document.
    Json,
    /// Aligned columns for terminal display.
    Table,
}

/// Statement provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProviderSelector {
    /// Yahoo Finance, falling back to Financial Modeling Prep when a key is set.
    Auto,
    /// Yahoo Finance only.
    Yahoo,
    /// Financial Modeling Prep only.
    Fmp,
}

/// Statement frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PeriodSelector {
    /// Annual statements.
    Annual,
    /// Quarterly statements.
    Quarterly,
}

impl From<PeriodSelector> for PeriodType {
    fn from(value: PeriodSelector) -> Self {
        match value {
            PeriodSelector::Annual => Self::Annual,
            PeriodSelector::Quarterly => Self::Quarterly,
        }
    }
}

/// Metrics selectable with `valuation metric`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum MetricName {
    /// Market cap over net current asset value.
    NetNet,
    /// Market cap over stockholders' equity.
    Mce,
    /// Stockholders' equity over total liabilities.
    EquityToDebt,
    /// EBIT over enterprise value.
    EarningsYield,
    /// Latest return on assets.
    Roa,
    /// Latest return on equity.
    Roe,
    /// Latest return on capital.
    Roc,
    /// Net income over enterprise value.
    Niev,
    /// Net income over revenue.
    NetMargin,
    /// Cash over current liabilities.
    CashRatio,
    /// Mean EBIT growth, percent.
    EarningsGrowth,
    /// Mean free cash flow growth, percent.
    FcfGrowth,
    /// Mean return on assets.
    AvgRoa,
    /// Mean return on equity.
    AvgRoe,
    /// Mean return on capital.
    AvgRoc,
    /// Weighted average cost of capital from the statements.
    Wacc,
    /// Free cash flow distress signal.
    FcfFlag,
    /// DCF value per share.
    Dcf,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Compute one metric for one or more tickers.
    ///
    ///   valuation metric net-net AAPL MSFT
    ///   valuation metric wacc IBM --format json
    Metric(MetricArgs),

    /// Compute every metric plus WACC and DCF for one or more tickers.
    ///
    ///   valuation report AAPL
    ///   valuation report AAPL MSFT --format table
    Report(ReportArgs),

    /// Value every ticker in a CSV file with a `symbol` or `ticker` column.
    ///
    ///   valuation batch watchlist.csv
    ///   valuation batch watchlist.csv --output results.csv
    Batch(BatchArgs),
}

/// Arguments for the `metric` command.
#[derive(Debug, Args)]
pub(crate) struct MetricArgs {
    /// Metric to compute.
    #[arg(value_enum)]
    pub(crate) name: MetricName,

    /// One or more tickers.
    #[arg(required = true, num_args = 1..)]
    pub(crate) tickers: Vec<String>,
}

/// Arguments for the `report` command.
#[derive(Debug, Args)]
pub(crate) struct ReportArgs {
    /// One or more tickers.
    #[arg(required = true, num_args = 1..)]
    pub(crate) tickers: Vec<String>,
}

/// Arguments for the `batch` command.
#[derive(Debug, Args)]
pub(crate) struct BatchArgs {
    /// CSV file listing tickers.
    pub(crate) input: PathBuf,

    /// Results file. Defaults to `<input stem>_valuation.csv`.
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,
}
