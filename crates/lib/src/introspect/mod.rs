//! Single-credential validation.
//!
//! An [`Introspector`] turns one credential into one [`Outcome`]. It never
//! returns an error: every remote failure is folded into an invalid outcome
//! with a [`FailureReason`], so callers such as the batch pipeline have no
//! per-item error handling to do.
//!
//! [`GraphIntrospector`] implements the provider's two-step protocol:
//!
//! 1. `GET {base}/debug_token?input_token=<credential>&access_token=<app_id>|<app_secret>`
//! 2. only if step 1 reports the credential valid,
//!    `GET {base}/me?fields=name,id&access_token=<credential>`

pub mod protocol;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::{AppCredentials, IntrospectConfig};
use crate::outcome::{FailureReason, Outcome};
use crate::{Error, Result};

use protocol::Introspection;

/// Longest slice of an error body kept in a transport failure message.
const MAX_ERROR_BODY: usize = 256;

/// Validates one credential at a time.
///
/// Implementations must be safe to call concurrently and must not share
/// mutable state between calls.
#[async_trait]
pub trait Introspector: Send + Sync {
    /// Validate `credential`. Always completes with an outcome.
    async fn introspect(&self, credential: &str) -> Outcome;
}

/// Failure of one remote call, before it is folded into an outcome.
#[derive(Debug)]
enum CallError {
    Timeout,
    Transport(String),
    Provider(Value),
}

impl CallError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CallError::Timeout
        } else {
            // The request URL carries credentials in its query string
            CallError::Transport(err.without_url().to_string())
        }
    }
}

impl From<CallError> for FailureReason {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Timeout => FailureReason::Timeout,
            CallError::Transport(message) => FailureReason::TransportFailure { message },
            CallError::Provider(error) => FailureReason::ProviderRejected { error },
        }
    }
}

/// [`Introspector`] backed by the provider's HTTP API.
///
/// One `reqwest::Client` is shared by every call, so clones of an
/// `Arc<GraphIntrospector>` reuse the same connection pool.
#[derive(Debug)]
pub struct GraphIntrospector {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<AppCredentials>,
}

impl GraphIntrospector {
    /// Create an introspector for the provider at `config.base_url`.
    pub fn new(credentials: Arc<AppCredentials>, config: &IntrospectConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!("invalid provider URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "provider URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url.query_pairs_mut().extend_pairs(params);
        url
    }

    /// Issue a GET and return the body of a 2xx response.
    async fn get(&self, url: Url) -> std::result::Result<Vec<u8>, CallError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        let status = response.status();
        let body = response.bytes().await.map_err(CallError::from_reqwest)?;
        if status.is_success() {
            return Ok(body.to_vec());
        }

        match protocol::provider_error(&body) {
            Some(error) => Err(CallError::Provider(error)),
            None => {
                let text = String::from_utf8_lossy(&body);
                let text: String = text.trim().chars().take(MAX_ERROR_BODY).collect();
                Err(CallError::Transport(format!("provider returned HTTP {status}: {text}")))
            }
        }
    }

    async fn inspect(&self, credential: &str) -> std::result::Result<Outcome, CallError> {
        let app_token = self.credentials.app_access_token();
        let url = self.endpoint(
            "debug_token",
            &[("input_token", credential), ("access_token", app_token.as_str())],
        );
        let body = self.get(url).await?;

        let (scopes, expires_at) = match protocol::interpret_debug_token(&body) {
            Introspection::Valid { scopes, expires_at } => (scopes, expires_at),
            Introspection::Rejected { error } => {
                return Ok(Outcome::invalid(
                    credential,
                    FailureReason::ProviderRejected { error },
                ));
            }
            Introspection::Unusable => {
                return Ok(Outcome::invalid(credential, FailureReason::InvalidResponse));
            }
        };

        let url = self.endpoint("me", &[("fields", "name,id"), ("access_token", credential)]);
        let body = self.get(url).await?;
        let Some(identity) = protocol::parse_identity(&body) else {
            return Ok(Outcome::invalid(credential, FailureReason::InvalidResponse));
        };

        Ok(Outcome::valid(credential, identity, scopes, expires_at))
    }
}

#[async_trait]
impl Introspector for GraphIntrospector {
    async fn introspect(&self, credential: &str) -> Outcome {
        let outcome = match self.inspect(credential).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    credential = %redact(credential),
                    "Introspection call failed: {err:?}"
                );
                Outcome::invalid(credential, err.into())
            }
        };

        tracing::debug!(
            credential = %redact(credential),
            valid = outcome.is_valid(),
            "Introspected credential"
        );
        outcome
    }
}

/// Shorten a credential for logging.
pub(crate) fn redact(credential: &str) -> String {
    let prefix: String = credential.chars().take(6).collect();
    if prefix.len() < credential.len() {
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}
