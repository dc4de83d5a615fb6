//! Typed webhook events.
//!
//! GitHub delivers webhooks as loosely-structured JSON. The parser converts
//! the raw payloads into these domain events; everything downstream of the
//! ingestion boundary works with typed data only. Event/action combinations
//! the bot does not care about never reach this module — the parser maps them
//! to "no event".

use crate::types::{CheckRunId, LabelEntry, PrNumber, PullRequestRef, RepoId, Sha};

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEvent {
    PullRequest(PullRequestEvent),
    CheckRun(CheckRunEvent),
    Ping(PingEvent),
}

impl GitHubEvent {
    /// The repository the event concerns, when the payload names one.
    pub fn repo(&self) -> Option<&RepoId> {
        match self {
            GitHubEvent::PullRequest(event) => Some(&event.repo),
            GitHubEvent::CheckRun(event) => Some(&event.repo),
            GitHubEvent::Ping(event) => event.repo.as_ref(),
        }
    }
}

/// `pull_request` actions the bot reacts to.
///
/// Every other action parses to no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrAction {
    Opened,
    Reopened,
    Edited,
    Synchronize,
    Closed,
    Labeled,
    Unlabeled,
}

/// A `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    pub action: PrAction,
    /// Snapshot of the pull request at delivery time, including its labels.
    pub pr: PullRequestRef,
    /// The label added or removed, for `labeled`/`unlabeled` actions.
    pub label: Option<LabelEntry>,
    /// Whether an `edited` action changed the title.
    pub title_changed: bool,
    /// Login of the account that triggered the delivery.
    pub sender: String,
}

/// A `check_run` event. Only the `rerequested` action is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunEvent {
    pub repo: RepoId,
    pub check_run_id: CheckRunId,
    /// Name of the check run being re-run; each reporter matches on its own.
    pub check_run_name: String,
    pub head_sha: Sha,
    /// Pull requests GitHub associated with the check run. Empty for commits
    /// pushed from forks; the handler then falls back to commit search.
    pub pull_requests: Vec<PrNumber>,
    pub sender: String,
}

/// A `ping` delivery, sent when the webhook is first configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingEvent {
    /// Organization-level hooks ping without a repository.
    pub repo: Option<RepoId>,
}
