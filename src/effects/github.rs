//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The production interpreter executes them against the GitHub API via
//! octocrab; tests script responses and assert on recorded effects.

use serde::{Deserialize, Serialize};

use crate::types::{CheckRunId, CheckRunResult, CommentId, LabelEntry, PrNumber, PullRequestRef, Sha};

/// A GitHub API effect.
///
/// Each variant describes one API operation. Effects are repo-scoped: the
/// interpreter is constructed for a single repository, so effects don't
/// include it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// Fetch a single PR by number.
    GetPr { pr: PrNumber },

    /// Check whether a branch exists on the repository.
    BranchExists { branch: String },

    /// Find the pull request whose head is `branch`, if any (any state).
    FindPrByHead { branch: String },

    /// Find the single open PR containing `sha`, via commit search.
    ///
    /// Used when a check-run payload lists no pull requests (fork PRs).
    FindOpenPrForCommit { sha: Sha },

    /// List all comments on a PR.
    ListComments { pr: PrNumber },

    /// List the labels currently on a PR.
    ListLabels { pr: PrNumber },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Open a pull request from `head_branch` against `base_branch`.
    CreatePr {
        head_branch: String,
        base_branch: String,
        title: String,
        body: String,
    },

    /// Post a comment on a PR.
    PostComment { pr: PrNumber, body: String },

    /// Add labels to a PR. Adding an already-present label is a no-op
    /// server-side, but callers check presence first to avoid the call.
    AddLabels { pr: PrNumber, labels: Vec<String> },

    /// Remove a label from a PR.
    RemoveLabel { pr: PrNumber, label: String },

    /// Delete a branch ref. Deleting an absent branch succeeds.
    DeleteBranch { branch: String },

    /// Create a completed check run for a commit.
    CreateCheckRun {
        name: String,
        head_sha: Sha,
        result: CheckRunResult,
    },
}

/// Response to a [`GitHubEffect`].
///
/// Each effect variant has a corresponding response variant; interpreters
/// must return the matching one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr` and `CreatePr`.
    Pr(PullRequestRef),

    /// Response to `BranchExists`.
    BranchExists(bool),

    /// Response to `FindPrByHead` and `FindOpenPrForCommit`.
    PrSearch(Option<PullRequestRef>),

    /// Response to `ListComments`.
    Comments(Vec<CommentData>),

    /// Response to `ListLabels`.
    Labels(Vec<LabelEntry>),

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },

    /// Response to `AddLabels`.
    LabelsAdded,

    /// Response to `RemoveLabel`.
    LabelRemoved,

    /// Response to `DeleteBranch`.
    BranchDeleted,

    /// Response to `CreateCheckRun`.
    CheckRunCreated { id: CheckRunId },
}

/// A comment on a PR, as returned by `ListComments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: CommentId,
    pub author: String,
    pub body: String,
}
