//! GitHub API client and effect interpreter.
//!
//! This module executes GitHub effects via the octocrab library. It
//! implements the `GitHubInterpreter` trait defined in the effects module.
//!
//! Key features:
//! - Repo-scoped client (the bot serves exactly one repository)
//! - Distinguishes transient vs permanent errors; no in-process retry
//!   (recovery is webhook redelivery)

mod client;
mod error;
mod interpreter;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
