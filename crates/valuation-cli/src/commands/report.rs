use tracing::instrument;
use valuation::{MetricsReport, Symbol, analyze_symbol};

use super::Context;
use crate::cli::ReportArgs;
use crate::output::TickerOutput;

#[instrument(skip(context), fields(count = args.tickers.len()))]
pub(crate) async fn run(args: &ReportArgs, context: &Context) -> Vec<TickerOutput<MetricsReport>> {
    let mut rows = Vec::with_capacity(args.tickers.len());
    for ticker in &args.tickers {
        let symbol = Symbol::new(ticker.as_str());
        let outcome =
            analyze_symbol(&context.registry, &context.engine, &symbol, &context.options).await;
        rows.push(TickerOutput::new(symbol, outcome));
    }
    rows
}
