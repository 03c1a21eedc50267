//! Check-file command - validates every token in a file or on stdin.

use std::path::Path;

use tokenscope::{CancelToken, lines_from_reader};
use tokio::io::BufReader;

use crate::cli::{CheckFileArgs, ProviderArgs};
use crate::output::{self, OutputFormat};
use crate::provider::create_validator;

/// Run the check-file command.
///
/// Ctrl+C stops dispatching new checks; tokens not yet sent are reported as
/// cancelled and everything already in flight is still reported.
pub async fn run(
    args: &CheckFileArgs,
    provider: &ProviderArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let validator = create_validator(provider)?;

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing in-flight checks");
                cancel.cancel();
            }
        })
    };

    let result = if args.path == Path::new("-") {
        let lines = lines_from_reader(BufReader::new(tokio::io::stdin()));
        validator.validate_batch_with_cancel(lines, cancel).await
    } else {
        let file = tokio::fs::File::open(&args.path)
            .await
            .map_err(|e| format!("Failed to open {}: {e}", args.path.display()))?;
        let lines = lines_from_reader(BufReader::new(file));
        validator.validate_batch_with_cancel(lines, cancel).await
    };
    interrupt.abort();

    let result = result?;
    output::print_batch(&result, format)?;
    Ok(())
}
