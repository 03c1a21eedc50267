//! Configuration values for the introspector and the batch pipeline.
//!
//! All of these are plain immutable values built once at startup and handed to
//! the components that need them. Nothing here reads the environment; that is
//! the job of the binary.

use std::fmt;
use std::time::Duration;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Default provider base URL.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

/// Default number of introspections allowed in flight per batch.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default bound on a single outbound HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on one credential's full introspection (both requests).
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(30);

/// Separator the provider requires between app id and app secret.
const APP_TOKEN_SEPARATOR: char = '|';

/// Application identity used to authorize introspection calls.
///
/// The secret is wiped from memory when the value is dropped and is never
/// printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AppCredentials {
    app_id: String,
    app_secret: String,
}

impl AppCredentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// True when both the app id and the secret are non-empty.
    ///
    /// Unconfigured credentials are still usable; the provider will simply
    /// reject every introspection.
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.is_empty()
    }

    /// The application access token, `"{app_id}|{app_secret}"`.
    pub fn app_access_token(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "{}{APP_TOKEN_SEPARATOR}{}",
            self.app_id, self.app_secret
        ))
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

/// Settings for [`crate::GraphIntrospector`].
#[derive(Debug, Clone)]
pub struct IntrospectConfig {
    /// Provider base URL, e.g. `https://graph.facebook.com` or a versioned
    /// prefix like `https://graph.facebook.com/v19.0`.
    pub base_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl Default for IntrospectConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl IntrospectConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Settings for [`crate::BatchPipeline`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    concurrency: usize,
    /// Deadline for one credential's introspection. Elapsed calls complete
    /// with a `timeout` outcome.
    pub item_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
        }
    }
}

impl BatchConfig {
    /// Set the in-flight window. Zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = timeout;
        self
    }

    /// Maximum number of introspections in flight at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}
