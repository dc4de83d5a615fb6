//! Core domain types for the backport bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;
pub mod labels;
pub mod pr;

// Re-export commonly used types at the module level
pub use ids::{CheckRunId, CommentId, DeliveryId, InvalidSha, PrNumber, RepoId, Sha};
pub use labels::{parse_label, Label, LabelConventions, VersionMarker};
pub use pr::{CheckRunConclusion, CheckRunOutput, CheckRunResult, LabelEntry, PullRequestRef};
