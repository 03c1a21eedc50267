//! Validator construction from command-line configuration.

use std::time::Duration;

use tokenscope::{AppCredentials, BatchConfig, IntrospectConfig, Validator};

use crate::cli::ProviderArgs;

/// Create a validator for the configured provider.
///
/// Missing app credentials are only warned about: the process still starts,
/// and the provider rejects every token until they are set.
pub fn create_validator(args: &ProviderArgs) -> Result<Validator, Box<dyn std::error::Error>> {
    let credentials = AppCredentials::new(
        args.app_id.clone().unwrap_or_default(),
        args.app_secret.clone().unwrap_or_default(),
    );
    if !credentials.is_configured() {
        tracing::warn!(
            "APP_ID or APP_SECRET not set. Set them as environment variables; \
             until then every token will be rejected"
        );
    }

    let request_timeout = Duration::from_secs(args.timeout);
    let introspect = IntrospectConfig::default()
        .with_base_url(&args.graph_url)
        .with_request_timeout(request_timeout);

    // Two sequential requests per credential, plus slack
    let batch = BatchConfig::default()
        .with_concurrency(args.concurrency)
        .with_item_timeout(request_timeout * 2 + Duration::from_secs(1));

    tracing::info!(
        provider = %args.graph_url,
        concurrency = batch.concurrency(),
        timeout_secs = args.timeout,
        "Validator configured"
    );

    Ok(Validator::graph(credentials, introspect, batch)?)
}
