//! Effects-as-data for GitHub and Git operations.
//!
//! This module defines effect types that describe operations without
//! executing them. This enables:
//! - Pure handler logic that decides what to do before anything happens
//! - Testability via mock interpreters
//! - Logging/tracing of intended operations
//!
//! The production interpreters live in the `github` and `git` modules.

pub mod git;
pub mod github;
pub mod interpreter;

pub use git::{GitEffect, GitResponse};
pub use github::{CommentData, GitHubEffect, GitHubResponse};
pub use interpreter::{GitHubInterpreter, GitInterpreter};
