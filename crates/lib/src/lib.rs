//!
//! Tokenscope: bulk validation of opaque access tokens against a remote introspection service.
//! This library provides the core components for checking one token or an
//! arbitrarily large list of them.
//!
//! ## Core Concepts
//!
//! Tokenscope is built around a few key pieces:
//!
//! * **Introspector (`introspect::Introspector`)**: Validates one credential against the
//!   provider and always completes with an `Outcome`, never an error.
//! * **Outcome (`outcome::Outcome`)**: The immutable result for one credential. It is either
//!   valid (identity, scopes, expiry) or invalid (a `FailureReason`), never both.
//! * **BatchPipeline (`batch::BatchPipeline`)**: Streams lines from a `LineSource`, keeps at
//!   most `W` introspections in flight, and reassembles the outcomes in input order.
//! * **Validator (`validator::Validator`)**: The facade used by servers and CLIs, exposing
//!   `validate_one` and `validate_batch`.

pub mod batch;
pub mod config;
pub mod introspect;
pub mod outcome;
pub mod validator;

pub use batch::{
    BatchPipeline, BatchResult, CancelToken, LineSource, decode_line, lines_from_iter,
    lines_from_reader,
};
pub use config::{AppCredentials, BatchConfig, IntrospectConfig};
pub use introspect::{GraphIntrospector, Introspector};
pub use outcome::{FailureReason, Identity, Outcome};
pub use validator::Validator;

/// Result type used throughout the Tokenscope library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Tokenscope library.
///
/// Per-credential problems never show up here; they are reported as a
/// [`FailureReason`] inside the credential's [`Outcome`]. These variants cover
/// request-level failures only.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A single check was requested with a blank credential.
    #[error("token required")]
    MissingCredential,

    /// The batch input could not be read.
    #[error("Failed to read input: {0}")]
    Source(#[source] std::io::Error),

    /// A validation worker task died before producing an outcome.
    #[error("Validation worker failed: {0}")]
    Worker(String),

    /// The outbound HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::MissingCredential => "validator",
            Error::Source(_) | Error::Worker(_) => "batch",
            Error::Client(_) => "introspect",
            Error::Config(_) => "config",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error was caused by the caller's input rather than by the service.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::MissingCredential)
    }

    /// Check if the batch input source could not be read.
    pub fn is_source_error(&self) -> bool {
        matches!(self, Error::Source(_))
    }
}
