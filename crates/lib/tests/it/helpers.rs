use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokenscope::{AppCredentials, BatchConfig, GraphIntrospector, IntrospectConfig, Validator};

pub const APP_ID: &str = "test-app";
pub const APP_SECRET: &str = "test-secret";

/// Expiry the mock reports for valid credentials.
pub const EXPIRES_AT: i64 = 1_900_000_000;

/// Provider message for `rejected*` credentials.
pub const SESSION_EXPIRED: &str = "Error validating access token: Session has expired";

/// A fake identity provider.
///
/// The behaviour of `/debug_token` is chosen by the inspected credential:
///
/// - `valid*`: valid, `scopes` array, fixed expiry
/// - `alt_scope*`: valid, scopes under the `scope` field
/// - `joined_scope*`: valid, `scope` as a comma separated string, no expiry
/// - `me_broken*`: valid, but `/me` answers 500 with a plain-text body
/// - `me_garbage*`: valid, but `/me` answers with an unusable body
/// - `rejected*`: `is_valid: false` with a provider error payload
/// - `no_data*`: 200 with no `data` field
/// - `garbage*`: 200 with a non-JSON body
/// - `oauth_error*`: 400 with a structured `{"error": ..}` body
/// - `bad_gateway*`: 502 with a plain-text body
/// - `hang*`: never answers within any sane timeout
///
/// Any request not signed with `APP_ID|APP_SECRET` is rejected.
pub struct MockProvider {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub async fn start() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/debug_token", get(debug_token))
            .route("/me", get(me))
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock provider");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock provider failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            calls,
        }
    }

    /// Total number of requests received on either endpoint.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> IntrospectConfig {
        IntrospectConfig::default()
            .with_base_url(&self.base_url)
            .with_request_timeout(Duration::from_secs(5))
    }

    pub fn introspector(&self) -> GraphIntrospector {
        introspector_for(&self.config())
    }

    pub fn validator(&self, batch: BatchConfig) -> Validator {
        Validator::graph(app_credentials(), self.config(), batch)
            .expect("Failed to build validator")
    }
}

pub fn app_credentials() -> AppCredentials {
    AppCredentials::new(APP_ID, APP_SECRET)
}

pub fn introspector_for(config: &IntrospectConfig) -> GraphIntrospector {
    GraphIntrospector::new(Arc::new(app_credentials()), config)
        .expect("Failed to build introspector")
}

async fn debug_token(
    State(calls): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);

    let expected_app_token = format!("{APP_ID}|{APP_SECRET}");
    if params.get("access_token") != Some(&expected_app_token) {
        return Json(json!({
            "data": {
                "is_valid": false,
                "error": {"code": 190, "message": "Invalid app access token"}
            }
        }))
        .into_response();
    }

    let token = params.get("input_token").cloned().unwrap_or_default();
    let valid_data = json!({
        "data": {"is_valid": true, "scopes": ["email", "public_profile"], "expires_at": EXPIRES_AT}
    });

    if token.starts_with("valid") || token.starts_with("me_") {
        Json(valid_data).into_response()
    } else if token.starts_with("alt_scope") {
        Json(json!({"data": {"is_valid": true, "scope": ["user_posts"], "expires_at": EXPIRES_AT}}))
            .into_response()
    } else if token.starts_with("joined_scope") {
        Json(json!({"data": {"is_valid": true, "scope": "email,pages_show_list", "expires_at": 0}}))
            .into_response()
    } else if token.starts_with("rejected") {
        Json(json!({
            "data": {
                "is_valid": false,
                "error": {"code": 190, "message": SESSION_EXPIRED}
            }
        }))
        .into_response()
    } else if token.starts_with("no_data") {
        Json(json!({"result": "ok"})).into_response()
    } else if token.starts_with("garbage") {
        (StatusCode::OK, "<html>definitely not json</html>").into_response()
    } else if token.starts_with("oauth_error") {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "message": "Malformed access token",
                    "type": "OAuthException",
                    "code": 190
                }
            })),
        )
            .into_response()
    } else if token.starts_with("bad_gateway") {
        (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
    } else if token.starts_with("hang") {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Json(valid_data).into_response()
    } else {
        Json(json!({"data": {"is_valid": false}})).into_response()
    }
}

async fn me(
    State(calls): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);

    if params.get("fields").map(String::as_str) != Some("name,id") {
        return (StatusCode::BAD_REQUEST, "missing fields").into_response();
    }

    let token = params.get("access_token").cloned().unwrap_or_default();
    if token.starts_with("me_broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "identity backend down").into_response();
    }
    if token.starts_with("me_garbage") {
        return Json(json!({"unexpected": true})).into_response();
    }

    Json(json!({"id": format!("id-{token}"), "name": format!("User {token}")})).into_response()
}
