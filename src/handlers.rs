//! HTTP route handlers for the statusline service.
//!
//! This module contains the HTTP route handler functions that process
//! incoming requests and return appropriate responses, plus the router that
//! wires them together.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::events::{StatusBus, StatusCreateEvent, StatusEvent, StatusReplyEvent};
use crate::webhook::{create_challenge_response, WEBHOOK_PATH};

type HandlerError = (StatusCode, Json<Value>);

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    bus: StatusBus,
    consumer_secret: Arc<String>,
}

impl AppState {
    pub fn new(bus: StatusBus, consumer_secret: impl Into<String>) -> Self {
        Self {
            bus,
            consumer_secret: Arc::new(consumer_secret.into()),
        }
    }
}

/// Query parameters of a CRC request.
#[derive(Debug, Deserialize)]
pub struct CrcParams {
    pub crc_token: Option<String>,
}

fn error_response(status: StatusCode, message: &str, error: String) -> HandlerError {
    (
        status,
        Json(json!({"status": "error", "message": message, "error": error})),
    )
}

/// Builds the application router.
///
/// Middleware (tracing, inbound rate limiting) is added by the caller.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(WEBHOOK_PATH, get(handle_crc).post(handle_webhook_event))
        .route("/status", post(handle_status_post))
        .route("/status/reply", post(handle_status_reply))
        .with_state(state)
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "statusline"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "statusline"}))
}

/// Handles the platform's challenge-response check on `GET /webhook/twitter`.
///
/// # Success Response
///
/// ```json
/// { "response_token": "sha256=<base64 HMAC>" }
/// ```
///
/// Returns 400 when `crc_token` is missing.
pub async fn handle_crc(
    State(state): State<AppState>,
    Query(params): Query<CrcParams>,
) -> Result<Json<Value>, HandlerError> {
    let Some(crc_token) = params.crc_token.filter(|token| !token.is_empty()) else {
        warn!("CRC request without crc_token");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing crc_token",
            "crc_token query parameter is required".to_string(),
        ));
    };

    match create_challenge_response(&crc_token, &state.consumer_secret) {
        Ok(response_token) => {
            info!("Answered webhook CRC check");
            Ok(Json(json!({"response_token": response_token})))
        }
        Err(e) => {
            error!("Failed to compute CRC response: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to compute CRC response",
                e.to_string(),
            ))
        }
    }
}

/// Acknowledges an account activity delivery on `POST /webhook/twitter`.
pub async fn handle_webhook_event(Json(payload): Json<Value>) -> StatusCode {
    let kinds: Vec<&str> = payload
        .as_object()
        .map(|fields| {
            fields
                .keys()
                .filter(|key| key.ends_with("_events"))
                .map(String::as_str)
                .collect()
        })
        .unwrap_or_default();

    info!(
        "Received account activity for user {}: {:?}",
        payload
            .get("for_user_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown"),
        kinds
    );
    StatusCode::OK
}

fn publish(state: &AppState, event: StatusEvent) -> Result<(StatusCode, Json<Value>), HandlerError> {
    match state.bus.publish(event) {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({"status": "accepted", "message": "Status queued"})),
        )),
        Err(e) => {
            error!("Failed to queue status: {}", e);
            Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Failed to queue status",
                e.to_string(),
            ))
        }
    }
}

fn reject_empty(text: &str) -> Result<(), HandlerError> {
    if text.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Status text is empty",
            "text must contain at least one non-whitespace character".to_string(),
        ));
    }
    Ok(())
}

/// Handles `POST /status`, queueing a new status (or thread).
///
/// # Request Body
///
/// ```json
/// { "text": "Hello world" }
/// ```
///
/// Responds 202 once the event is queued; posting happens in the background.
pub async fn handle_status_post(
    State(state): State<AppState>,
    Json(event): Json<StatusCreateEvent>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    reject_empty(&event.text)?;
    publish(&state, StatusEvent::Tweet(event))
}

/// Handles `POST /status/reply`, queueing a reply (or reply thread).
///
/// # Request Body
///
/// ```json
/// { "text": "Thanks!", "in_reply_to_tweet_id": "1234", "user": "alice" }
/// ```
pub async fn handle_status_reply(
    State(state): State<AppState>,
    Json(event): Json<StatusReplyEvent>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    reject_empty(&event.text)?;
    if event.in_reply_to_tweet_id.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing in_reply_to_tweet_id",
            "in_reply_to_tweet_id must not be empty".to_string(),
        ));
    }
    publish(&state, StatusEvent::Reply(event))
}
