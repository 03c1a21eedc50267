//! Provider wire format.
//!
//! The introspection endpoint (`debug_token`) answers with
//! `{"data": {"is_valid": bool, "scopes": [..], "expires_at": <unix secs>, "error": {..}}}`
//! and the identity endpoint (`me`) with `{"id": "..", "name": ".."}`.
//! Error responses carry `{"error": {..}}`.
//!
//! The provider is inconsistent about the scope field: it is reported as
//! either `scopes` or `scope`, as an array or as a comma/space separated
//! string. Both names and both forms are accepted and `scopes` wins when both
//! are present.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::outcome::Identity;

/// Envelope of the introspection response.
#[derive(Debug, Deserialize)]
pub struct DebugTokenResponse {
    #[serde(default)]
    pub data: Option<DebugTokenData>,
}

/// Attributes reported for the inspected credential.
#[derive(Debug, Deserialize)]
pub struct DebugTokenData {
    #[serde(default)]
    pub is_valid: Option<Value>,
    #[serde(default)]
    pub scopes: Option<Value>,
    #[serde(default)]
    pub scope: Option<Value>,
    #[serde(default)]
    pub expires_at: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Identity endpoint response.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Value,
}

/// What the introspection response says about a credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Introspection {
    Valid {
        scopes: Vec<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    /// The provider reported the credential invalid; `error` is its payload verbatim.
    Rejected { error: Value },
    /// Body absent, not JSON, or missing `data`.
    Unusable,
}

/// Interpret a successful (2xx) introspection body.
pub fn interpret_debug_token(body: &[u8]) -> Introspection {
    let Ok(response) = serde_json::from_slice::<DebugTokenResponse>(body) else {
        return Introspection::Unusable;
    };
    let Some(data) = response.data else {
        return Introspection::Unusable;
    };

    if data.is_valid.as_ref().and_then(Value::as_bool) != Some(true) {
        return Introspection::Rejected {
            error: data.error.unwrap_or(Value::Null),
        };
    }

    let scopes = present(data.scopes)
        .or_else(|| present(data.scope))
        .map(scope_list)
        .unwrap_or_default();

    Introspection::Valid {
        scopes,
        expires_at: data.expires_at.as_ref().and_then(expiry),
    }
}

/// Parse a successful (2xx) identity body.
pub fn parse_identity(body: &[u8]) -> Option<Identity> {
    let me: MeResponse = serde_json::from_slice(body).ok()?;
    let id = match me.id {
        Value::String(id) if !id.is_empty() => id,
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    Some(Identity::new(id, me.name.unwrap_or_default()))
}

/// Extract the structured `error` value from a non-2xx body, if there is one.
pub fn provider_error(body: &[u8]) -> Option<Value> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
        .filter(|error| !error.is_null())
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn scope_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Value::String(joined) => joined
            .split([',', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Unix seconds to a timestamp. Zero means the credential never expires.
fn expiry(value: &Value) -> Option<DateTime<Utc>> {
    let secs = value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))?;
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
