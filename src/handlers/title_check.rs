//! Title convention check for maintenance-branch PRs.
//!
//! PRs against a maintenance branch must be titled `[marker] subject (#N)`.
//! Every relevant delivery publishes a fresh completed check run at the PR's
//! current head SHA; GitHub keys check runs by (name, SHA), so repeats
//! overwrite rather than accumulate.

use crate::effects::{GitHubInterpreter, GitInterpreter};
use crate::git::GitError;
use crate::github::GitHubApiError;
use crate::types::{
    CheckRunConclusion, CheckRunOutput, CheckRunResult, PrNumber, VersionMarker,
};
use crate::webhooks::events::{CheckRunEvent, PullRequestEvent};

use super::{HandlerContext, HandlerError, create_check_run, resolve_check_run_pr};

pub const CHECK_RUN_NAME: &str = "Verify title of PR to maintenance branch";

/// The bracketed marker at the start of a title, if it looks like one.
///
/// "Looks like" means the bracket contents start with a digit and consist of
/// digits, dots, and `x`, so ordinary titles like "[WIP] Fix it" are treated
/// as having no marker rather than the wrong one.
fn leading_marker(title: &str) -> Option<&str> {
    let rest = title.strip_prefix('[')?;
    let contents = &rest[..rest.find(']')?];
    let looks_like_marker = contents.chars().next().is_some_and(|c| c.is_ascii_digit())
        && contents
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == 'x');
    looks_like_marker.then_some(contents)
}

/// The `(#N)` reference at the end of a title, if present.
pub(crate) fn trailing_pr_number(title: &str) -> Option<PrNumber> {
    let inner = title.trim_end().strip_suffix(')')?;
    let digits = &inner[inner.rfind("(#")? + 2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(PrNumber)
}

/// Checks `title` against the convention for `expected`'s maintenance branch.
pub fn verify_title(expected: &VersionMarker, title: &str) -> CheckRunResult {
    let prefix_example = |corrected: &str| {
        format!(
            "Title of a PR made to a maintenance branch must be prefixed with \
             the branch's name, for example:\n```\n{corrected}\n```"
        )
    };

    // `example` is the title as it should look (corrected where the prefix
    // was wrong); the missing-number note below reuses it.
    let (mut conclusion, mut output, example) = match leading_marker(title) {
        None => {
            let corrected = format!("{} {}", expected.title_prefix(), title);
            let output = CheckRunOutput::new(
                "PR title is not prefixed with the branch's name.",
                prefix_example(&corrected),
            );
            (CheckRunConclusion::Failure, output, corrected)
        }
        Some(found) if found != expected.as_str() => {
            let corrected = format!(
                "{} {}",
                expected.title_prefix(),
                title.replacen(&format!("[{found}] "), "", 1)
            );
            let output = CheckRunOutput::new(
                "PR title is prefixed with incorrect branch's name.",
                prefix_example(&corrected),
            );
            (CheckRunConclusion::Failure, output, corrected)
        }
        Some(_) => {
            let output = CheckRunOutput::new(
                "PR title is prefixed with maintenance branch's name.",
                "Title of a PR has a proper prefix.",
            );
            (CheckRunConclusion::Success, output, title.to_string())
        }
    };

    if trailing_pr_number(title).is_none() {
        output.summary.push_str(&format!(
            "\n\nNote: If this is a backport of a different PR, you should \
             also include the original PR number, for example:\n\
             ```\n{example} (#123)\n```"
        ));
        if conclusion == CheckRunConclusion::Success {
            conclusion = CheckRunConclusion::Neutral;
            output.title = "PR title is prefixed with maintenance branch's name, \
                            but it does not include original PR number."
                .to_string();
        }
    }

    CheckRunResult::new(conclusion, output)
}

pub async fn handle_pull_request<G, R>(
    ctx: &HandlerContext<'_, G, R>,
    event: &PullRequestEvent,
) -> Result<(), HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Sync,
    R: GitInterpreter<Error = GitError> + Sync,
{
    let Some(marker) = ctx.config.marker_for_branch(&event.pr.base_branch) else {
        return Ok(());
    };
    let result = verify_title(&marker, &event.pr.normalized_title());
    tracing::debug!(pr = %event.pr.number, conclusion = ?result.conclusion, "reporting title check");
    create_check_run(ctx.github, CHECK_RUN_NAME, &event.pr.head_sha, result).await
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
        tracing::warn!(check_run_id = %event.check_run_id, "no PR found for rerequested title check");
        return Ok(());
    };
    let Some(marker) = ctx.config.marker_for_branch(&pr.base_branch) else {
        return Ok(());
    };
    let result = verify_title(&marker, &pr.normalized_title());
    create_check_run(ctx.github, CHECK_RUN_NAME, &pr.head_sha, result).await
}
