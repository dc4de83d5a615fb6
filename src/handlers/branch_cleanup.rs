//! Deletes the bot's backport branches once their PR is merged.
//!
//! Only fires for PRs authored by the bot account whose head branch follows
//! the backport naming scheme, so human branches are never touched. Branch
//! deletion on the platform side is tolerant of the branch already being
//! gone, which makes redeliveries harmless.

use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::webhooks::events::PullRequestEvent;

use super::backport::is_backport_branch;
use super::{HandlerContext, HandlerError, delete_branch};

pub async fn handle_pull_request<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    if !event.pr.merged {
        return Ok(());
    }
    if !is_backport_branch(&event.pr.head_branch) {
        return Ok(());
    }
    tracing::info!(
        pr = %event.pr.number,
        branch = %event.pr.head_branch,
        "deleting merged backport branch"
    );
    delete_branch(ctx.github, event.pr.head_branch.clone()).await
}
