//! Validation outcomes.
//!
//! An [`Outcome`] records the result of validating exactly one credential. It
//! is either valid, carrying the owning identity, granted scopes, and expiry, or
//! invalid, carrying a [`FailureReason`]. The two groups are mutually exclusive
//! and the only way to build an `Outcome` is through [`Outcome::valid`] or
//! [`Outcome::invalid`], so a half-populated value cannot exist.
//!
//! Outcomes serialize to the shape upstream callers already consume:
//!
//! ```json
//! {"token": "EAAB...", "valid": true, "user": {"id": "1", "name": "Ada"},
//!  "scope": ["email"], "expires_at": "2030-03-17T17:46:40Z"}
//! {"token": "EAAB...", "valid": false, "reason": {"kind": "timeout"}}
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// The identity a valid credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Why a credential was reported invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The provider explicitly rejected the credential. `error` is the
    /// provider's own payload, passed through untouched (`null` if it sent none).
    ProviderRejected { error: serde_json::Value },

    /// The provider answered, but with nothing usable.
    InvalidResponse,

    /// The request failed at the network or HTTP level.
    TransportFailure { message: String },

    /// The call did not complete within its bound.
    Timeout,

    /// The batch was cancelled before this credential was dispatched.
    Cancelled,
}

impl FailureReason {
    pub fn transport(message: impl Into<String>) -> Self {
        FailureReason::TransportFailure {
            message: message.into(),
        }
    }

    /// Stable tag for this reason, identical to its serialized `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::ProviderRejected { .. } => "provider_rejected",
            FailureReason::InvalidResponse => "invalid_response",
            FailureReason::TransportFailure { .. } => "transport_failure",
            FailureReason::Timeout => "timeout",
            FailureReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ProviderRejected { error } if !error.is_null() => {
                write!(f, "{}: {error}", self.kind())
            }
            FailureReason::TransportFailure { message } => write!(f, "{}: {message}", self.kind()),
            _ => f.write_str(self.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Valid {
        identity: Identity,
        scopes: Vec<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    Invalid {
        reason: FailureReason,
    },
}

/// The validation result for one credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    credential: String,
    verdict: Verdict,
}

impl Outcome {
    /// Build a valid outcome.
    ///
    /// Duplicate scopes are dropped; the first occurrence wins. `expires_at`
    /// of `None` means the credential does not expire, or the provider did not say.
    pub fn valid(
        credential: impl Into<String>,
        identity: Identity,
        scopes: impl IntoIterator<Item = String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for scope in scopes {
            if !unique.contains(&scope) {
                unique.push(scope);
            }
        }

        Self {
            credential: credential.into(),
            verdict: Verdict::Valid {
                identity,
                scopes: unique,
                expires_at,
            },
        }
    }

    /// Build an invalid outcome.
    pub fn invalid(credential: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            credential: credential.into(),
            verdict: Verdict::Invalid { reason },
        }
    }

    /// The credential this outcome describes, exactly as submitted.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.verdict, Verdict::Valid { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.verdict {
            Verdict::Valid { identity, .. } => Some(identity),
            Verdict::Invalid { .. } => None,
        }
    }

    /// Granted scopes. Empty for invalid outcomes.
    pub fn scopes(&self) -> &[String] {
        match &self.verdict {
            Verdict::Valid { scopes, .. } => scopes,
            Verdict::Invalid { .. } => &[],
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.verdict {
            Verdict::Valid { expires_at, .. } => *expires_at,
            Verdict::Invalid { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.verdict {
            Verdict::Valid { .. } => None,
            Verdict::Invalid { reason } => Some(reason),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.verdict {
            Verdict::Valid {
                identity,
                scopes,
                expires_at,
            } => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("token", &self.credential)?;
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("user", identity)?;
                map.serialize_entry("scope", scopes)?;
                map.serialize_entry("expires_at", expires_at)?;
                map.end()
            }
            Verdict::Invalid { reason } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("token", &self.credential)?;
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
        }
    }
}
