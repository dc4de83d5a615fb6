//! Health check endpoint for liveness probes.

use axum::http::StatusCode;

/// Returns 200 OK with the text "OK".
///
/// Deliberately trivial: the bot holds no state whose health could be
/// reported beyond "the server answers".
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
