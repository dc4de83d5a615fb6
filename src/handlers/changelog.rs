//! Changelog-entry bookkeeping for merged development PRs.
//!
//! A PR merged into the development branch should end up with exactly one
//! changelog-entry label. If the author picked one before merging, nothing
//! happens; otherwise the Pending label is added so release notes tooling
//! can find the stragglers.

use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::Label;
use crate::webhooks::events::PullRequestEvent;

use super::{HandlerContext, HandlerError, add_labels};

/// The status given to merged PRs whose changelog entry is still owed.
const PENDING_STATUS: &str = "Pending";

pub async fn handle_pull_request<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    if !event.pr.merged || event.pr.base_branch != ctx.config.development_branch {
        return Ok(());
    }

    let has_entry = event
        .pr
        .parsed_labels(&ctx.config.labels)
        .any(|label| matches!(label, Label::ChangelogEntry { .. }));
    if has_entry {
        return Ok(());
    }

    let pending = ctx.config.labels.changelog_label(PENDING_STATUS);
    tracing::info!(pr = %event.pr.number, label = %pending, "marking changelog entry as pending");
    add_labels(ctx.github, event.pr.number, vec![pending]).await
}
