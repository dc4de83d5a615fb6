//! Webhook event handlers.
//!
//! One module per handler the classifier can select. Handlers are generic
//! over the effect interpreters, so tests drive them against in-memory fakes
//! and assert on the recorded effects.
//!
//! The typed wrappers in this module turn `interpret` + response matching
//! into ordinary async calls; a response variant that doesn't match its
//! effect is a bug in the interpreter and surfaces as
//! [`HandlerError::UnexpectedResponse`].

pub mod backport;
pub mod backport_links;
pub mod blocked_labels;
pub mod branch_cleanup;
pub mod changelog;
pub mod label_sync;
pub mod title_check;

use thiserror::Error;

use crate::config::BotConfig;
use crate::effects::{
    CommentData, GitEffect, GitHubEffect, GitHubInterpreter, GitHubResponse, GitInterpreter,
    GitResponse,
};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::{
    CheckRunResult, CommentId, LabelEntry, PrNumber, PullRequestRef, Sha,
};
use crate::webhooks::events::{CheckRunEvent, GitHubEvent};
use crate::webhooks::routing::Handler;

/// Everything a handler invocation needs.
pub struct HandlerContext<'a, G, R> {
    pub config: &'a BotConfig,
    pub github: &'a G,
    pub git: &'a R,
}

/// Errors from handler execution. Any of these fails the delivery (HTTP
/// 500); GitHub's redelivery is the retry mechanism.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    GitHub(#[from] GitHubApiError),

    #[error(transparent)]
    Git(#[from] GitError),

    /// An interpreter answered an effect with the wrong response variant.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse { effect: String, response: String },
}

impl HandlerError {
    fn unexpected(effect: &str, response: &GitHubResponse) -> Self {
        HandlerError::UnexpectedResponse {
            effect: effect.to_string(),
            response: format!("{response:?}"),
        }
    }
}

/// Runs one classified handler against an event.
pub async fn dispatch<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    handler: Handler,
    event: &GitHubEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    match (handler, event) {
        (Handler::Backport, GitHubEvent::PullRequest(event)) => {
            backport::handle_pull_request(ctx, event).await
        }
        (Handler::TitleCheck, GitHubEvent::PullRequest(event)) => {
            title_check::handle_pull_request(ctx, event).await
        }
        (Handler::TitleCheck, GitHubEvent::CheckRun(event)) => {
            title_check::handle_check_run(ctx, event).await
        }
        (Handler::BlockedLabels, GitHubEvent::PullRequest(event)) => {
            blocked_labels::handle_pull_request(ctx, event).await
        }
        (Handler::BlockedLabels, GitHubEvent::CheckRun(event)) => {
            blocked_labels::handle_check_run(ctx, event).await
        }
        (Handler::BackportLinks, GitHubEvent::PullRequest(event)) => {
            backport_links::handle_pull_request(ctx, event).await
        }
        (Handler::Changelog, GitHubEvent::PullRequest(event)) => {
            changelog::handle_pull_request(ctx, event).await
        }
        (Handler::BranchCleanup, GitHubEvent::PullRequest(event)) => {
            branch_cleanup::handle_pull_request(ctx, event).await
        }
        // The classifier never pairs these.
        _ => Ok(()),
    }
}

// ─── Typed effect wrappers ────────────────────────────────────────────────────

pub(crate) async fn get_pr<G>(github: &G, pr: PrNumber) -> Result<PullRequestRef, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::GetPr { pr }).await? {
        GitHubResponse::Pr(pr) => Ok(pr),
        other => Err(HandlerError::unexpected("GetPr", &other)),
    }
}

pub(crate) async fn branch_exists<G>(github: &G, branch: &str) -> Result<bool, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::BranchExists {
        branch: branch.to_string(),
    };
    match github.interpret(effect).await? {
        GitHubResponse::BranchExists(exists) => Ok(exists),
        other => Err(HandlerError::unexpected("BranchExists", &other)),
    }
}

pub(crate) async fn find_pr_by_head<G>(
    github: &G,
    branch: &str,
) -> Result<Option<PullRequestRef>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::FindPrByHead {
        branch: branch.to_string(),
    };
    match github.interpret(effect).await? {
        GitHubResponse::PrSearch(found) => Ok(found),
        other => Err(HandlerError::unexpected("FindPrByHead", &other)),
    }
}

pub(crate) async fn find_open_pr_for_commit<G>(
    github: &G,
    sha: &Sha,
) -> Result<Option<PullRequestRef>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::FindOpenPrForCommit { sha: sha.clone() };
    match github.interpret(effect).await? {
        GitHubResponse::PrSearch(found) => Ok(found),
        other => Err(HandlerError::unexpected("FindOpenPrForCommit", &other)),
    }
}

pub(crate) async fn list_comments<G>(
    github: &G,
    pr: PrNumber,
) -> Result<Vec<CommentData>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::ListComments { pr }).await? {
        GitHubResponse::Comments(comments) => Ok(comments),
        other => Err(HandlerError::unexpected("ListComments", &other)),
    }
}

pub(crate) async fn list_labels<G>(
    github: &G,
    pr: PrNumber,
) -> Result<Vec<LabelEntry>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::ListLabels { pr }).await? {
        GitHubResponse::Labels(labels) => Ok(labels),
        other => Err(HandlerError::unexpected("ListLabels", &other)),
    }
}

pub(crate) async fn create_pr<G>(
    github: &G,
    head_branch: String,
    base_branch: String,
    title: String,
    body: String,
) -> Result<PullRequestRef, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::CreatePr {
        head_branch,
        base_branch,
        title,
        body,
    };
    match github.interpret(effect).await? {
        GitHubResponse::Pr(pr) => Ok(pr),
        other => Err(HandlerError::unexpected("CreatePr", &other)),
    }
}

pub(crate) async fn post_comment<G>(
    github: &G,
    pr: PrNumber,
    body: String,
) -> Result<CommentId, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::PostComment { pr, body }).await? {
        GitHubResponse::CommentPosted { id } => Ok(id),
        other => Err(HandlerError::unexpected("PostComment", &other)),
    }
}

pub(crate) async fn add_labels<G>(
    github: &G,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::AddLabels { pr, labels }).await? {
        GitHubResponse::LabelsAdded => Ok(()),
        other => Err(HandlerError::unexpected("AddLabels", &other)),
    }
}

pub(crate) async fn remove_label<G>(
    github: &G,
    pr: PrNumber,
    label: String,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::RemoveLabel { pr, label }).await? {
        GitHubResponse::LabelRemoved => Ok(()),
        other => Err(HandlerError::unexpected("RemoveLabel", &other)),
    }
}

pub(crate) async fn delete_branch<G>(github: &G, branch: String) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match github.interpret(GitHubEffect::DeleteBranch { branch }).await? {
        GitHubResponse::BranchDeleted => Ok(()),
        other => Err(HandlerError::unexpected("DeleteBranch", &other)),
    }
}

pub(crate) async fn create_check_run<G>(
    github: &G,
    name: &str,
    head_sha: &Sha,
    result: CheckRunResult,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::CreateCheckRun {
        name: name.to_string(),
        head_sha: head_sha.clone(),
        result,
    };
    match github.interpret(effect).await? {
        GitHubResponse::CheckRunCreated { .. } => Ok(()),
        other => Err(HandlerError::unexpected("CreateCheckRun", &other)),
    }
}

pub(crate) async fn replay<G2>(
    git: &G2,
    commit: Sha,
    target_branch: String,
    new_branch: String,
) -> Result<GitResponse, HandlerError>
where
    G2: GitInterpreter<Error = GitError>,
{
    Ok(git
        .interpret(GitEffect::Replay {
            commit,
            target_branch,
            new_branch,
        })
        .await?)
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Posts `body` on `pr` unless an identical comment already exists.
///
/// This is the redelivery guard: the greeting, apology, and cross-link
/// comments all have deterministic bodies, so an exact-match scan of the
/// existing comments decides whether the delivery already ran.
///
/// Returns true if a comment was posted.
pub(crate) async fn ensure_comment<G>(
    github: &G,
    pr: PrNumber,
    body: &str,
) -> Result<bool, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let comments = list_comments(github, pr).await?;
    if comments.iter().any(|comment| comment.body == body) {
        tracing::debug!(%pr, "comment already present, skipping");
        return Ok(false);
    }
    post_comment(github, pr, body.to_string()).await?;
    Ok(true)
}

/// Resolves the PR a rerequested check run concerns.
///
/// The payload usually names it; fork PRs arrive with an empty list and fall
/// back to commit search. Multiple listed PRs are ambiguous: log and skip.
pub(crate) async fn resolve_check_run_pr<G>(
    github: &G,
    event: &CheckRunEvent,
) -> Result<Option<PullRequestRef>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match event.pull_requests.as_slice() {
        [] => find_open_pr_for_commit(github, &event.head_sha).await,
        [pr] => Ok(Some(get_pr(github, *pr).await?)),
        prs => {
            tracing::error!(
                check_run_id = %event.check_run_id,
                ?prs,
                "check run rerequested with multiple associated PRs, skipping"
            );
            Ok(None)
        }
    }
}
