//! Pull request snapshots and check-run results.
//!
//! Nothing here is persisted: a [`PullRequestRef`] is read from a webhook
//! payload or an API fetch, consulted during one delivery, and dropped.

use serde::{Deserialize, Serialize};

use super::ids::{PrNumber, Sha};
use super::labels::{parse_label, Label, LabelConventions};

/// A label as it appears on a PR: name plus optional description.
///
/// The description is carried because the Blocked-status summary prints it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl LabelEntry {
    pub fn new(name: impl Into<String>) -> Self {
        LabelEntry {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(name: impl Into<String>, description: impl Into<String>) -> Self {
        LabelEntry {
            name: name.into(),
            description: Some(description.into()),
        }
    }
}

/// A point-in-time view of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// The PR number.
    pub number: PrNumber,

    /// The PR title, as delivered (see [`PullRequestRef::normalized_title`]).
    pub title: String,

    /// The PR body; empty when GitHub sends null.
    #[serde(default)]
    pub body: String,

    /// Login of the PR author.
    pub author: String,

    /// The base branch the PR targets (e.g., "V3/develop" or "V3/3.x").
    pub base_branch: String,

    /// The name of the PR's head branch.
    pub head_branch: String,

    /// The current head SHA of the PR branch.
    pub head_sha: Sha,

    /// Labels currently on the PR.
    pub labels: Vec<LabelEntry>,

    /// Whether the PR has been merged.
    pub merged: bool,

    /// The SHA of the merge commit; present once merged.
    pub merge_commit_sha: Option<Sha>,
}

impl PullRequestRef {
    /// The title with GitHub's "…" spill-over undone.
    ///
    /// When a title is too long, GitHub truncates it with "…" and continues it
    /// in the body behind a leading "…"; splice the first body line back on so
    /// convention checks see the real title.
    pub fn normalized_title(&self) -> String {
        match (
            self.title.strip_suffix('…'),
            self.body.strip_prefix('…'),
        ) {
            (Some(head), Some(rest)) => {
                let continuation = rest.lines().next().unwrap_or("").trim_end_matches('\r');
                format!("{head}{continuation}")
            }
            _ => self.title.clone(),
        }
    }

    /// Interprets the PR's labels under the given conventions.
    pub fn parsed_labels<'a>(
        &'a self,
        conventions: &'a LabelConventions,
    ) -> impl Iterator<Item = Label> + 'a {
        self.labels.iter().map(|l| parse_label(conventions, &l.name))
    }

    /// True if a label with exactly this name is present.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

/// Conclusion of a check run produced by this bot.
///
/// The bot only ever reports these three; the platform's other conclusions
/// (cancelled, timed out, ...) have no producer here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunConclusion {
    Success,
    Failure,
    Neutral,
}

/// The human-readable part of a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CheckRunOutput {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        CheckRunOutput {
            title: title.into(),
            summary: summary.into(),
            text: None,
        }
    }
}

/// A completed check-run report: written once per delivery, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunResult {
    pub conclusion: CheckRunConclusion,
    pub output: CheckRunOutput,
}

impl CheckRunResult {
    pub fn new(conclusion: CheckRunConclusion, output: CheckRunOutput) -> Self {
        CheckRunResult { conclusion, output }
    }
}
