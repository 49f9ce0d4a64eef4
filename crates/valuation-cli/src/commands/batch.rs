use valuation::{BatchSummary, run_batch};

use super::Context;
use crate::cli::BatchArgs;
use crate::error::CliError;

pub(crate) async fn run(args: &BatchArgs, context: &Context) -> Result<BatchSummary, CliError> {
    let summary = run_batch(
        &context.registry,
        &context.engine,
        &args.input,
        args.output.as_deref(),
        &context.options,
    )
    .await?;
    Ok(summary)
}
