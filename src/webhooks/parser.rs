//! Raw webhook JSON → typed [`GitHubEvent`] conversion.
//!
//! Each event kind has a small set of `Raw*` serde mirror structs describing
//! just the payload fields the bot reads. Unknown event types and unhandled
//! actions parse to `Ok(None)`; malformed payloads for known combinations are
//! a [`ParseError`].

use serde::Deserialize;
use thiserror::Error;

use crate::types::{
    CheckRunId, LabelEntry, PrNumber, PullRequestRef, RepoId, Sha,
};
use crate::webhooks::events::{
    CheckRunEvent, GitHubEvent, PingEvent, PrAction, PullRequestEvent,
};

/// Errors from parsing a webhook payload.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not valid JSON or is missing required fields.
    #[error("failed to parse webhook payload")]
    JsonError(#[from] serde_json::Error),

    /// A field was present but had an invalid value.
    #[error("invalid field {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook delivery into a typed event.
///
/// `event_type` comes from the `x-github-event` header. Returns `Ok(None)`
/// for event types and actions the bot does not handle.
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "pull_request" => parse_pull_request(payload),
        "check_run" => parse_check_run(payload),
        "ping" => parse_ping(payload).map(Some),
        _ => Ok(None),
    }
}

// Shared raw structures

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    owner: RawOwner,
}

impl RawRepository {
    fn into_repo_id(self) -> RepoId {
        RepoId::new(&self.owner.login, &self.name)
    }
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl RawLabel {
    fn into_entry(self) -> LabelEntry {
        LabelEntry {
            name: self.name,
            description: self.description,
        }
    }
}

// pull_request event

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    sender: RawUser,
    #[serde(default)]
    label: Option<RawLabel>,
    #[serde(default)]
    changes: Option<RawChanges>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: RawUser,
    base: RawRef,
    head: RawRef,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawChanges {
    #[serde(default)]
    title: Option<serde_json::Value>,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "reopened" => PrAction::Reopened,
        "edited" => PrAction::Edited,
        "synchronize" => PrAction::Synchronize,
        "closed" => PrAction::Closed,
        "labeled" => PrAction::Labeled,
        "unlabeled" => PrAction::Unlabeled,
        _ => return Ok(None),
    };

    let head_sha = Sha::parse(&raw.pull_request.head.sha).map_err(|_| ParseError::InvalidField {
        field: "pull_request.head.sha",
        value: raw.pull_request.head.sha.clone(),
    })?;
    let merge_commit_sha = match &raw.pull_request.merge_commit_sha {
        Some(sha) => Some(Sha::parse(sha).map_err(|_| ParseError::InvalidField {
            field: "pull_request.merge_commit_sha",
            value: sha.clone(),
        })?),
        None => None,
    };

    let title_changed = raw
        .changes
        .as_ref()
        .is_some_and(|changes| changes.title.is_some());

    let pr = PullRequestRef {
        number: PrNumber(raw.pull_request.number),
        title: raw.pull_request.title,
        body: raw.pull_request.body.unwrap_or_default(),
        author: raw.pull_request.user.login,
        base_branch: raw.pull_request.base.ref_name,
        head_branch: raw.pull_request.head.ref_name,
        head_sha,
        labels: raw
            .pull_request
            .labels
            .into_iter()
            .map(RawLabel::into_entry)
            .collect(),
        merged: raw.pull_request.merged,
        merge_commit_sha,
    };

    Ok(Some(GitHubEvent::PullRequest(PullRequestEvent {
        repo: raw.repository.into_repo_id(),
        action,
        pr,
        label: raw.label.map(RawLabel::into_entry),
        title_changed,
        sender: raw.sender.login,
    })))
}

// check_run event

#[derive(Debug, Deserialize)]
struct RawCheckRunPayload {
    action: String,
    check_run: RawCheckRun,
    repository: RawRepository,
    sender: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawCheckRun {
    id: u64,
    name: String,
    head_sha: String,
    #[serde(default)]
    pull_requests: Vec<RawCheckRunPr>,
}

#[derive(Debug, Deserialize)]
struct RawCheckRunPr {
    number: u64,
}

fn parse_check_run(payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    let raw: RawCheckRunPayload = serde_json::from_slice(payload)?;

    // created/completed deliveries include our own check runs; ignore them.
    if raw.action != "rerequested" {
        return Ok(None);
    }

    let head_sha = Sha::parse(&raw.check_run.head_sha).map_err(|_| ParseError::InvalidField {
        field: "check_run.head_sha",
        value: raw.check_run.head_sha.clone(),
    })?;

    Ok(Some(GitHubEvent::CheckRun(CheckRunEvent {
        repo: raw.repository.into_repo_id(),
        check_run_id: CheckRunId(raw.check_run.id),
        check_run_name: raw.check_run.name,
        head_sha,
        pull_requests: raw
            .check_run
            .pull_requests
            .into_iter()
            .map(|pr| PrNumber(pr.number))
            .collect(),
        sender: raw.sender.login,
    })))
}

// ping event

#[derive(Debug, Deserialize)]
struct RawPingPayload {
    #[serde(default)]
    repository: Option<RawRepository>,
}

fn parse_ping(payload: &[u8]) -> Result<GitHubEvent, ParseError> {
    let raw: RawPingPayload = serde_json::from_slice(payload)?;
    Ok(GitHubEvent::Ping(PingEvent {
        repo: raw.repository.map(RawRepository::into_repo_id),
    }))
}
