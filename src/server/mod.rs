//! HTTP server for the backport bot.
//!
//! Accepts webhooks from GitHub, validates signatures, and processes each
//! delivery synchronously before responding; GitHub's redelivery is the retry
//! queue, so nothing is persisted server-side.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::config::BotConfig;
use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;

/// Shared application state.
///
/// Passed to all handlers via Axum's `State` extractor. Generic over the
/// interpreters so the full pipeline can be exercised against in-memory
/// fakes.
pub struct AppState<G, R> {
    inner: Arc<AppStateInner<G, R>>,
}

impl<G, R> Clone for AppState<G, R> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<G, R> {
    /// The bot configuration.
    config: BotConfig,

    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    /// GitHub API interpreter.
    github: Arc<G>,

    /// Local git interpreter.
    git: Arc<R>,
}

impl<G, R> AppState<G, R> {
    pub fn new(
        config: BotConfig,
        webhook_secret: impl Into<Vec<u8>>,
        github: Arc<G>,
        git: Arc<R>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                config,
                webhook_secret: webhook_secret.into(),
                github,
                git,
            }),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn github(&self) -> &G {
        &self.inner.github
    }

    pub fn git(&self) -> &R {
        &self.inner.git
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G, R>(app_state: AppState<G, R>) -> axum::Router
where
    G: GitHubInterpreter<Error = GitHubApiError> + Send + Sync + 'static,
    R: GitInterpreter<Error = GitError> + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<G, R>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
