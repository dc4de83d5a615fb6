//! Webhook endpoint handler.
//!
//! Processes each GitHub delivery synchronously: verify the signature, parse
//! the payload, classify it, and run every selected handler before
//! responding. A handler failure returns 500 so GitHub redelivers; the
//! handlers' idempotency guards make the redelivery safe.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::handlers::{HandlerContext, HandlerError, dispatch};
use crate::types::DeliveryId;
use crate::webhooks::events::GitHubEvent;
use crate::webhooks::routing::classify;
use crate::webhooks::{ParseError, parse_webhook, verify_signature};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Payload did not parse as the event type the header announced.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// A handler failed; GitHub should redeliver.
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "check_run")
///   - `X-GitHub-Delivery`: Unique delivery ID (UUID format)
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Delivery fully processed (or deliberately ignored)
/// - 400 Bad Request: Missing header or malformed payload
/// - 401 Unauthorized: Invalid signature
/// - 500 Internal Server Error: A handler failed; redeliver
pub async fn webhook_handler<G, R>(
    State(app_state): State<AppState<G, R>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Send + Sync + 'static,
    R: GitInterpreter<Error = GitError> + Send + Sync + 'static,
{
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id_str = get_header(&headers, HEADER_DELIVERY)?;
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;

    let delivery_id = DeliveryId::new(delivery_id_str);

    debug!(
        delivery_id = %delivery_id,
        event_type = %event_type,
        "received webhook"
    );

    // Verify the signature BEFORE any parsing: unauthenticated bytes get no
    // further processing.
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body)? else {
        debug!(delivery_id = %delivery_id, event_type = %event_type, "unhandled event, ignoring");
        return Ok((StatusCode::OK, "Ignored"));
    };

    // Single-repository bot: acknowledge and drop anything else.
    let config = app_state.config();
    if let Some(repo) = event.repo() {
        if repo != &config.repository {
            warn!(delivery_id = %delivery_id, %repo, "delivery for unexpected repository, ignoring");
            return Ok((StatusCode::OK, "Ignored"));
        }
    }

    if let GitHubEvent::Ping(_) = event {
        info!(delivery_id = %delivery_id, "ping received");
        return Ok((StatusCode::OK, "Pong"));
    }

    let selected = classify(&event, config);
    if selected.is_empty() {
        debug!(delivery_id = %delivery_id, "no handler applies");
        return Ok((StatusCode::OK, "Ignored"));
    }

    let ctx = HandlerContext {
        config,
        github: app_state.github(),
        git: app_state.git(),
    };
    for handler in selected {
        debug!(delivery_id = %delivery_id, ?handler, "dispatching");
        if let Err(err) = dispatch(&ctx, handler, &event).await {
            warn!(delivery_id = %delivery_id, ?handler, error = %err, "handler failed");
            return Err(err.into());
        }
    }

    info!(delivery_id = %delivery_id, event_type = %event_type, "delivery processed");
    Ok((StatusCode::OK, "OK"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "pull_request".parse().unwrap());

        let result = get_header(&headers, "x-github-event").unwrap();
        assert_eq!(result, "pull_request");
    }

    #[test]
    fn get_header_missing() {
        let headers = HeaderMap::new();

        let result = get_header(&headers, "x-github-event");
        assert!(matches!(result, Err(WebhookError::MissingHeader(_))));
    }

    #[test]
    fn error_statuses() {
        use axum::response::IntoResponse;

        let response = WebhookError::InvalidSignature.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = WebhookError::MissingHeader("x-github-event").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
