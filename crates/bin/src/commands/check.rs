//! Check command - validates a single token.

use crate::cli::{CheckArgs, ProviderArgs};
use crate::output::{self, OutputFormat};
use crate::provider::create_validator;

/// Run the check command. Exits with status 1 when the token is invalid.
pub async fn run(
    args: &CheckArgs,
    provider: &ProviderArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let validator = create_validator(provider)?;
    let outcome = validator.validate_one(&args.token).await?;

    output::print_outcome(&outcome, format)?;

    if !outcome.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
