//! Effect interpreter traits.
//!
//! The trait-based design enables:
//! - Mock interpreters for testing handlers without network or a git clone
//! - Logging/tracing interpreters
//!
//! Production implementations live in `github::interpreter` (octocrab) and
//! `git::backport` (subprocess git).

use std::future::Future;

use super::git::{GitEffect, GitResponse};
use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed for a single repository, so all effects
/// executed through one interpreter instance are scoped to it.
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Interprets git effects against the bot's local clone.
pub trait GitInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a git effect and return its response.
    fn interpret(
        &self,
        effect: GitEffect,
    ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send;
}
