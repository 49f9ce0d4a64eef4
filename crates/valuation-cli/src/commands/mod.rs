mod batch;
mod metric;
mod report;

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;
use valuation::{AnalysisOptions, EngineConfig, ProviderRegistry, ValuationEngine};

use crate::cli::{Cli, Command, ProviderSelector};
use crate::error::CliError;

/// Everything a command needs to fetch and value tickers.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) registry: ProviderRegistry,
    pub(crate) engine: ValuationEngine,
    pub(crate) options: AnalysisOptions,
}

impl Context {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.periods == 0 {
            return Err(CliError::Usage("--periods must be at least 1".to_string()));
        }

        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        if cli.verbose {
            config = config.with_trace_inputs(true);
        }

        let options = AnalysisOptions::default()
            .with_period_type(cli.period.into())
            .with_periods(cli.periods)
            .with_external_rate(cli.external_rate)
            .with_fetch_external_rate(!cli.no_external_rate)
            .with_default_rate(cli.default_discount_rate);

        Ok(Self {
            registry: build_registry(cli)?,
            engine: ValuationEngine::new(config)?,
            options,
        })
    }
}

/// Reads engine settings from a JSON file. Absent keys take their defaults.
pub(crate) fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn build_registry(cli: &Cli) -> Result<ProviderRegistry, CliError> {
    let api_key = cli.fmp_api_key.as_deref().filter(|key| !key.is_empty());

    let mut registry = match (cli.provider, api_key) {
        (ProviderSelector::Auto, Some(key)) => ProviderRegistry::new().with_yahoo().with_fmp(key),
        (ProviderSelector::Auto | ProviderSelector::Yahoo, _) => {
            ProviderRegistry::new().with_yahoo()
        }
        (ProviderSelector::Fmp, Some(key)) => ProviderRegistry::new().with_fmp(key),
        (ProviderSelector::Fmp, None) => {
            return Err(CliError::Usage(
                "--provider fmp needs --fmp-api-key or FMP_API_KEY".to_string(),
            ));
        }
    };

    if !cli.no_external_rate && cli.external_rate.is_none() {
        registry = registry.with_gurufocus();
    }

    debug!(registry = ?registry, "providers configured");
    Ok(registry)
}

/// Runs the selected command, writing results to `out`.
///
/// Per-ticker failures are rendered alongside the successes and then
/// reported as [`CliError::TickersFailed`].
pub(crate) async fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    let context = Context::from_cli(cli)?;

    match &cli.command {
        Command::Metric(args) => {
            let rows = metric::run(args, &context).await;
            crate::output::render_metrics(out, &rows, cli.format, cli.pretty)?;
            check_failures(rows.iter().filter(|row| row.is_failure()).count(), rows.len())
        }
        Command::Report(args) => {
            let rows = report::run(args, &context).await;
            crate::output::render_reports(out, &rows, cli.format, cli.pretty)?;
            check_failures(rows.iter().filter(|row| row.is_failure()).count(), rows.len())
        }
        Command::Batch(args) => {
            let summary = batch::run(args, &context).await?;
            crate::output::render_batch(out, &summary, cli.format, cli.pretty)
        }
    }
}

fn check_failures(failed: usize, total: usize) -> Result<(), CliError> {
    if failed > 0 {
        Err(CliError::TickersFailed { failed, total })
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::Parser;
    use std::sync::Arc;
    use valuation::{
        DataProvider, FinancialSnapshot, FundamentalSnapshotProvider, PeriodType, Result,
        SnapshotHistory, Symbol, ValuationError,
    };

    /// Serves one fixed history per ticker.
    #[derive(Debug, Default)]
    pub(crate) struct FixedProvider {
        histories: Vec<SnapshotHistory>,
    }

    impl FixedProvider {
        pub(crate) fn with_history(mut self, history: SnapshotHistory) -> Self {
            self.histories.push(history);
            self
        }
    }

    impl DataProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn description(&self) -> &str {
            "fixed test histories"
        }

        fn supported_periods(&self) -> &[PeriodType] {
            &[PeriodType::Annual]
        }
    }

    #[async_trait]
    impl FundamentalSnapshotProvider for FixedProvider {
        async fn fetch_history(
            &self,
            symbol: &Symbol,
            _period_type: PeriodType,
            _periods: usize,
        ) -> Result<SnapshotHistory> {
            self.histories
                .iter()
                .find(|h| h.symbol() == symbol)
                .cloned()
                .ok_or_else(|| ValuationError::SymbolNotFound(symbol.to_string()))
        }
    }

    pub(crate) fn acme_history() -> SnapshotHistory {
        let period = |ebit: f64| {
            FinancialSnapshot::builder("ACME")
                .ebit(ebit)
                .net_income(ebit / 2.0)
                .revenue(ebit * 5.0)
                .market_cap(400.0)
                .current_assets(500.0)
                .total_liabilities(200.0)
                .stockholders_equity(500.0)
                .long_term_debt(100.0)
                .interest_expense(5.0)
                .income_tax_expense(ebit * 0.2)
                .operating_cash_flow(50.0)
                .capital_expenditures(10.0)
                .shares_outstanding(10.0)
                .price(12.0)
                .build()
        };
        SnapshotHistory::new(
            "ACME",
            vec![period(120.0), period(100.0), period(80.0)],
        )
        .unwrap()
    }

    pub(crate) fn context() -> Context {
        let mut registry = ProviderRegistry::new();
        registry.register_snapshot(Arc::new(FixedProvider::default().with_history(acme_history())));
        Context {
            registry,
            engine: ValuationEngine::new(EngineConfig::default()).unwrap(),
            options: AnalysisOptions::default().with_fetch_external_rate(false),
        }
    }

    #[test]
    fn test_load_config_with_partial_dcf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"trace_inputs": true, "dcf": {"horizon_years": 5}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.trace_inputs);
        assert_eq!(config.dcf.horizon_years, 5);
        assert_eq!(config.dcf.terminal_growth_rate, 0.04);
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load_config(&missing), Err(CliError::Config { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let err = load_config(&broken).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_engine_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"dcf": {"horizon_years": 0}}"#).unwrap();

        let cli = Cli::try_parse_from([
            "valuation",
            "--config",
            path.to_str().unwrap(),
            "report",
            "ACME",
        ])
        .unwrap();
        let err = Context::from_cli(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_context_options_from_flags() {
        let cli = Cli::try_parse_from([
            "valuation",
            "report",
            "ACME",
            "--provider",
            "yahoo",
            "--periods",
            "6",
            "--default-discount-rate",
            "0.07",
            "--no-external-rate",
            "--verbose",
        ])
        .unwrap();
        let context = Context::from_cli(&cli).unwrap();
        assert_eq!(context.options.periods, 6);
        assert!(!context.options.fetch_external_rate);
        assert_eq!(context.options.policy.default_rate(), Some(0.07));
        assert!(context.engine.config().trace_inputs);
        assert!(!context.registry.has_rate_providers());
    }

    #[test]
    fn test_fmp_requires_api_key() {
        let mut cli =
            Cli::try_parse_from(["valuation", "report", "ACME", "--provider", "fmp"]).unwrap();
        cli.fmp_api_key = None;
        let err = Context::from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_zero_periods_is_usage_error() {
        let cli = Cli::try_parse_from(["valuation", "report", "ACME", "--periods", "0"]).unwrap();
        assert!(matches!(Context::from_cli(&cli), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_check_failures() {
        assert!(check_failures(0, 2).is_ok());
        assert!(matches!(
            check_failures(1, 2),
            Err(CliError::TickersFailed { failed: 1, total: 2 })
        ));
    }
}
