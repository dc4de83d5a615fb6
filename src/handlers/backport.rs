//! Backport orchestrator.
//!
//! Triggered when a PR carrying a backport-request label is merged (or when
//! such a label lands on an already-merged PR). For each requested target,
//! newest line first: replay the merge commit onto a fresh branch cut from
//! the maintenance branch, open the backport PR, copy labels, and cross-link
//! it from the source PR.
//!
//! Terminal per-target failures (unknown branch, branch-name collision,
//! replay conflict) become comments on the source PR and never block the
//! remaining targets. Transient failures abort the delivery so the sender
//! redelivers; every comment is guarded by an exact-body idempotency check.

use std::collections::{BTreeMap, BTreeSet};

use crate::effects::{GitHubInterpreter, GitInterpreter, GitResponse};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::{PrNumber, RepoId, Sha, VersionMarker, parse_label};
use crate::webhooks::events::{PrAction, PullRequestEvent};

use super::{
    HandlerContext, HandlerError, branch_exists, create_pr, ensure_comment, find_pr_by_head,
    label_sync, list_labels, remove_label, replay,
};

/// The deterministic backport branch name for a (source PR, target) pair.
pub fn branch_name(pr: PrNumber, marker: &VersionMarker) -> String {
    format!("backport-{}-to-{}", pr.0, marker)
}

/// True if `name` follows the backport branch naming scheme.
pub fn is_backport_branch(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("backport-") else {
        return false;
    };
    let Some((number, marker)) = rest.split_once("-to-") else {
        return false;
    };
    !marker.is_empty() && number.parse::<u64>().is_ok()
}

/// The canonical cross-link comment posted on the source PR.
///
/// The Backport Bookkeeper posts the identical body for manually-created
/// backports, so the idempotency guard spans both producers.
pub(crate) fn link_comment(
    repo: &RepoId,
    backport_pr: PrNumber,
    marker: &VersionMarker,
    branch: &str,
) -> String {
    format!(
        "{} is a backport of this pull request to [{}]({}).",
        backport_pr,
        marker,
        repo.tree_url(branch)
    )
}

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

    // For `labeled`, only the label that fired the event counts; a `closed`
    // delivery considers the full label set.
    let candidates: Vec<&str> = match (&event.action, &event.label) {
        (PrAction::Labeled, Some(label)) => vec![label.name.as_str()],
        (PrAction::Labeled, None) => Vec::new(),
        _ => event.pr.labels.iter().map(|l| l.name.as_str()).collect(),
    };

    // Supported markers carry their resolved maintenance branch from here on.
    let mut supported = BTreeMap::new();
    let mut unsupported = BTreeSet::new();
    for name in candidates {
        if let Some(target) = parse_label(&ctx.config.labels, name).backport_target() {
            match ctx.config.branch_for_marker(target) {
                Some(branch) => {
                    supported.insert(target.clone(), branch.to_string());
                }
                None => {
                    unsupported.insert(target.clone());
                }
            }
        }
    }
    if supported.is_empty() && unsupported.is_empty() {
        return Ok(());
    }

    let Some(commit) = event.pr.merge_commit_sha.clone() else {
        tracing::error!(pr = %event.pr.number, "merged PR has no merge commit SHA, cannot backport");
        return Ok(());
    };

    if !unsupported.is_empty() {
        tracing::warn!(
            pr = %event.pr.number,
            markers = ?unsupported,
            "backport requested to unconfigured maintenance lines"
        );
        let body = unsupported_comment(
            &event.sender,
            !supported.is_empty(),
            &unsupported,
            &commit,
        );
        ensure_comment(ctx.github, event.pr.number, &body).await?;
    }

    if supported.is_empty() {
        return Ok(());
    }

    // Newest line first.
    let targets: Vec<(VersionMarker, String)> = supported.into_iter().rev().collect();
    let joined: Vec<&str> = targets.iter().map(|(marker, _)| marker.as_str()).collect();
    let greeting = format!(
        "Thanks @{} for the PR 🎉. I'm working now to backport this PR to: {}.",
        event.pr.author,
        joined.join(", ")
    );
    ensure_comment(ctx.github, event.pr.number, &greeting).await?;

    for (marker, target_branch) in &targets {
        // Terminal failures turn into a comment and processing continues
        // with the next target; transient errors propagate and fail the
        // whole delivery.
        if let Some(failure) = backport_target(ctx, event, marker, target_branch, &commit).await? {
            ensure_comment(ctx.github, event.pr.number, &failure).await?;
        }
    }

    Ok(())
}

/// Backports to one target. Returns the failure comment body for terminal
/// failures, `None` on success or redelivery skip.
async fn backport_target<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
    marker: &VersionMarker,
    target_branch: &str,
    commit: &Sha,
) -> Result<Option<String>, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    let source = event.pr.number;

    if !branch_exists(ctx.github, target_branch).await? {
        return Ok(Some(format!(
            "Sorry @{}, the maintenance branch `{}` for backport label \
             `{}` does not exist on the repository, so I can't backport this PR to {}.",
            event.sender,
            target_branch,
            ctx.config.labels.backport_label(marker),
            marker
        )));
    }

    let new_branch = branch_name(source, marker);

    if let Some(existing) = find_pr_by_head(ctx.github, &new_branch).await? {
        // Redelivery after a successful backport: only make sure the
        // bookkeeping on the source PR is in place.
        tracing::info!(%source, backport = %existing.number, "backport PR already exists, skipping");
        finish_backport(ctx, source, existing.number, marker, target_branch).await?;
        return Ok(None);
    }

    if branch_exists(ctx.github, &new_branch).await? {
        return Ok(Some(format!(
            "Sorry @{}, branch `{}` already exists but no pull request was opened \
             from it, so I can't backport this PR to {}. Please delete the branch \
             and re-add the `{}` label, or open the backport manually.",
            event.sender,
            new_branch,
            marker,
            ctx.config.labels.backport_label(marker)
        )));
    }

    match replay(
        ctx.git,
        commit.clone(),
        target_branch.to_string(),
        new_branch.clone(),
    )
    .await?
    {
        GitResponse::Replayed { head } => {
            tracing::info!(%source, %marker, %head, "replayed merge commit onto backport branch");
        }
        GitResponse::Conflict { files } => {
            return Ok(Some(conflict_comment(
                &event.sender,
                target_branch,
                &files,
                commit,
            )));
        }
    }

    let title = format!(
        "{} {} ({})",
        marker.title_prefix(),
        event.pr.normalized_title(),
        source
    );
    let body = format!("Backport of {} to `{}`.", source, target_branch);
    let backport_pr =
        create_pr(ctx.github, new_branch, target_branch.to_string(), title, body).await?;
    tracing::info!(%source, backport = %backport_pr.number, %marker, "opened backport PR");

    label_sync::copy_labels(ctx.github, &ctx.config.labels, &event.pr, backport_pr.number).await?;
    finish_backport(ctx, source, backport_pr.number, marker, target_branch).await?;
    Ok(None)
}

/// Step-7 bookkeeping on the source PR: cross-link comment plus removal of
/// the satisfied backport-request label. Safe to repeat.
async fn finish_backport<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    source: PrNumber,
    backport_pr: PrNumber,
    marker: &VersionMarker,
    target_branch: &str,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    let body = link_comment(&ctx.config.repository, backport_pr, marker, target_branch);
    ensure_comment(ctx.github, source, &body).await?;

    let label = ctx.config.labels.backport_label(marker);
    let current = list_labels(ctx.github, source).await?;
    if current.iter().any(|l| l.name == label) {
        remove_label(ctx.github, source, label).await?;
    }
    Ok(())
}

fn unsupported_comment(
    sender: &str,
    some_supported: bool,
    markers: &BTreeSet<VersionMarker>,
    commit: &Sha,
) -> String {
    let scope = if some_supported {
        "some of the branches"
    } else {
        "the branches"
    };
    let joined: Vec<&str> = markers.iter().map(VersionMarker::as_str).collect();
    format!(
        "Sorry @{}, {} you want to backport to ({}) seem to not be maintenance \
         branches. Please backport manually using `git cherry-pick` on command line.\n\
         ```\ngit cherry-pick -x {}\n```",
        sender,
        scope,
        joined.join(", "),
        commit
    )
}

fn conflict_comment(sender: &str, branch: &str, files: &[String], commit: &Sha) -> String {
    let mut body = format!(
        "Sorry, @{}, I could not cleanly backport this to `{}` due to a conflict.\n",
        sender, branch
    );
    body.push_str("The following files conflicted:\n");
    for file in files {
        body.push_str(&format!("- `{}`\n", file));
    }
    body.push_str(&format!(
        "Please backport using `git cherry-pick` on command line.\n```\ngit cherry-pick -x {}\n```",
        commit
    ));
    body
}
