//! Blocked-status reporting.
//!
//! Surfaces blocking labels as a check run so a blocked PR shows a red check
//! instead of relying on reviewers noticing the label. Merged PRs are left
//! alone; the label no longer means anything once the PR is in.

use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::{
    CheckRunConclusion, CheckRunOutput, CheckRunResult, LabelConventions, LabelEntry,
    PullRequestRef, parse_label,
};
use crate::webhooks::events::{CheckRunEvent, PullRequestEvent};

use super::{HandlerContext, HandlerError, create_check_run, resolve_check_run_pr};

pub const CHECK_RUN_NAME: &str = "Blocked status";

/// Builds the Blocked-status report for a PR's current label set.
pub fn evaluate(conventions: &LabelConventions, labels: &[LabelEntry]) -> CheckRunResult {
    let blocking: Vec<&LabelEntry> = labels
        .iter()
        .filter(|l| parse_label(conventions, &l.name).is_blocking())
        .collect();

    if blocking.is_empty() {
        return CheckRunResult::new(
            CheckRunConclusion::Success,
            CheckRunOutput::new(
                "PR is not blocked by anything.",
                "The PR is not labeled with any Blocked labels.",
            ),
        );
    }

    let mut summary = String::from("The PR is labeled with these Blocked labels:\n");
    for label in blocking {
        summary.push_str(&format!(
            "- {} - {}\n",
            label.name,
            label.description.as_deref().unwrap_or("No description")
        ));
    }
    CheckRunResult::new(
        CheckRunConclusion::Failure,
        CheckRunOutput::new(
            "PR is blocked by something, see labels and PR description for more information.",
            summary,
        ),
    )
}

async fn report<G>(
    github: &G,
    conventions: &LabelConventions,
    pr: &PullRequestRef,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let result = evaluate(conventions, &pr.labels);
    tracing::debug!(pr = %pr.number, conclusion = ?result.conclusion, "reporting blocked status");
    create_check_run(github, CHECK_RUN_NAME, &pr.head_sha, result).await
}

pub async fn handle_pull_request<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    if event.pr.merged {
        return Ok(());
    }
    report(ctx.github, &ctx.config.labels, &event.pr).await
}

pub async fn handle_check_run<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &CheckRunEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    if event.check_run_name != CHECK_RUN_NAME {
        return Ok(());
    }
    let Some(pr) = resolve_check_run_pr(ctx.github, event).await? else {
        tracing::warn!(check_run_id = %event.check_run_id, "no PR found for rerequested blocked check");
        return Ok(());
    };
    if pr.merged {
        return Ok(());
    }
    report(ctx.github, &ctx.config.labels, &pr).await
}
