//! Bookkeeping for manually-opened backport PRs.
//!
//! When someone backports by hand instead of waiting for the bot, their PR
//! still follows the title convention `[marker] subject (#N)`. This handler
//! spots such titles, and if the referenced PR still carries the matching
//! backport-request label, performs the same bookkeeping the orchestrator
//! would have: drop the label, cross-link the backport, copy labels over.
//!
//! The label check is the guard against false positives: an unrelated title
//! that happens to parse touches nothing.

use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::{PrNumber, VersionMarker};
use crate::webhooks::events::PullRequestEvent;

use super::title_check::trailing_pr_number;
use super::{
    HandlerContext, HandlerError, backport, ensure_comment, get_pr, label_sync, remove_label,
};

/// Parses `[marker] subject (#N)` against the configured maintenance lines.
fn parse_backport_title(
    config: &crate::config::BotConfig,
    title: &str,
) -> Option<(VersionMarker, PrNumber)> {
    let rest = title.strip_prefix('[')?;
    let marker = VersionMarker::new(&rest[..rest.find(']')?]);
    if config.branch_for_marker(&marker).is_none() {
        return None;
    }
    let original = trailing_pr_number(title)?;
    Some((marker, original))
}

pub async fn handle_pull_request<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    let title = event.pr.normalized_title();
    let Some((marker, original)) = parse_backport_title(ctx.config, &title) else {
        return Ok(());
    };
    if original == event.pr.number {
        return Ok(());
    }

    let original_pr = match get_pr(ctx.github, original).await {
        Ok(pr) => pr,
        Err(HandlerError::GitHub(err)) if err.is_not_found() => {
            tracing::warn!(pr = %event.pr.number, %original, "title references a nonexistent PR");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let label = ctx.config.labels.backport_label(&marker);
    if !original_pr.has_label(&label) {
        return Ok(());
    }
    tracing::info!(
        backport = %event.pr.number,
        %original,
        %marker,
        "recording manual backport"
    );

    remove_label(ctx.github, original, label).await?;

    // parse_backport_title only accepts configured markers.
    if let Some(branch) = ctx.config.branch_for_marker(&marker) {
        let body = backport::link_comment(&ctx.config.repository, event.pr.number, &marker, branch);
        ensure_comment(ctx.github, original, &body).await?;
    }

    label_sync::copy_labels(ctx.github, &ctx.config.labels, &original_pr, event.pr.number).await?;
    Ok(())
}
