//! Serve command - runs the Tokenscope HTTP server.

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};

use tokenscope::{Error, Validator};

use crate::cli::{ProviderArgs, ServeArgs};
use crate::provider::create_validator;
use crate::upload::ChunkedLines;

/// Multipart field carrying the token list.
const UPLOAD_FIELD: &str = "tokensFile";

/// Shared application state
#[derive(Clone)]
struct AppState {
    validator: Validator,
}

/// Single-check request body, accepted as JSON or as a form
#[derive(Debug, Default, Deserialize)]
struct CheckTokenRequest {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Run the Tokenscope server
pub async fn run(
    args: &ServeArgs,
    provider: &ProviderArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let validator = create_validator(provider)?;
    let app = router(AppState { validator }, args.max_upload_mb * 1024 * 1024);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Listening on {local_addr}");

    println!("Tokenscope server running on http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  POST /api/check-token - Validate one token (JSON or form field `token`)");
    println!(
        "  POST /api/check-file  - Validate an uploaded list (multipart field `{UPLOAD_FIELD}`)"
    );
    println!("  GET  /health          - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to set up SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("failed to set up SIGINT handler");

            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            tracing::info!("Received {name}, initiating graceful shutdown...");
        })
        .await?;

    println!("Server shut down");
    Ok(())
}

fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handle_health_endpoint))
        .route("/api/check-token", post(handle_check_token))
        .route(
            "/api/check-file",
            post(handle_check_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn status_for(err: &Error) -> StatusCode {
    if err.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Handler for GET /health
async fn handle_health_endpoint() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Handler for POST /api/check-token
///
/// An unreadable body is treated like a body without a token.
async fn handle_check_token(State(state): State<AppState>, request: Request) -> Response {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let body = if is_json {
        Json::<CheckTokenRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .unwrap_or_default()
    } else {
        Form::<CheckTokenRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .unwrap_or_default()
    };
    let token = body.token.unwrap_or_default();

    match state.validator.validate_one(&token).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

/// Handler for POST /api/check-file
///
/// Streams the `tokensFile` field through the batch pipeline; the response is
/// sent once every line has an outcome.
async fn handle_check_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return error_response(StatusCode::BAD_REQUEST, "file required"),
            Err(e) => return error_response(e.status(), e.body_text()),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("<unnamed>").to_string();
        tracing::info!("Checking uploaded file {file_name}");

        return match state.validator.validate_batch(ChunkedLines::new(field)).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => {
                tracing::warn!("Upload {file_name} failed: {e}");
                error_response(status_for(&e), e.to_string())
            }
        };
    }
}
