use tracing::instrument;
use valuation::{Result, SnapshotHistory, Symbol, external_rate};

use super::Context;
use crate::cli::{MetricArgs, MetricName};
use crate::output::{MetricValue, TickerOutput};

/// Computes `name` from an already fetched history.
///
/// `rate` is only consulted for [`MetricName::Dcf`].
pub(crate) fn evaluate(
    context: &Context,
    name: MetricName,
    history: &SnapshotHistory,
    rate: Option<f64>,
) -> MetricValue {
    let engine = &context.engine;
    let latest = history.latest();
    let metric = match name {
        MetricName::NetNet => engine.net_net(latest),
        MetricName::Mce => engine.market_cap_to_equity(latest),
        MetricName::EquityToDebt => engine.equity_to_debt(latest),
        MetricName::EarningsYield => engine.earnings_yield(latest),
        MetricName::Roa => engine.return_on_assets(latest),
        MetricName::Roe => engine.return_on_equity(latest),
        MetricName::Roc => engine.return_on_capital(latest),
        MetricName::Niev => engine.net_income_to_ev(latest),
        MetricName::NetMargin => engine.net_margin(latest),
        MetricName::CashRatio => engine.cash_ratio(latest),
        MetricName::EarningsGrowth => engine.average_earnings_growth(history),
        MetricName::FcfGrowth => engine.average_fcf_growth(history),
        MetricName::AvgRoa => engine.average_return_on_assets(history),
        MetricName::AvgRoe => engine.average_return_on_equity(history),
        MetricName::AvgRoc => engine.average_return_on_capital(history),
        MetricName::Wacc => engine.wacc(history).rate,
        MetricName::FcfFlag => {
            return MetricValue::Signal {
                fcf_signal: engine.free_cash_flow_signal(history),
            };
        }
        MetricName::Dcf => {
            engine
                .report(history, rate, &context.options.policy)
                .dcf
                .value_per_share
        }
    };
    MetricValue::Metric(metric)
}

async fn fetch_and_evaluate(
    context: &Context,
    name: MetricName,
    symbol: &Symbol,
) -> Result<MetricValue> {
    let options = &context.options;
    let history = context
        .registry
        .fetch_history(symbol, options.period_type, options.periods)
        .await?;
    let rate = match name {
        MetricName::Dcf => external_rate(&context.registry, symbol, options).await,
        _ => None,
    };
    Ok(evaluate(context, name, &history, rate))
}

#[instrument(skip(context), fields(metric = ?args.name))]
pub(crate) async fn run(args: &MetricArgs, context: &Context) -> Vec<TickerOutput<MetricValue>> {
    let mut rows = Vec::with_capacity(args.tickers.len());
    for ticker in &args.tickers {
        let symbol = Symbol::new(ticker.as_str());
        let outcome = fetch_and_evaluate(context, args.name, &symbol).await;
        rows.push(TickerOutput::new(symbol, outcome));
    }
    rows
}
