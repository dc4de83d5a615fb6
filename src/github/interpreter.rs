//! GitHub effect interpreter using octocrab.
//!
//! Executes [`GitHubEffect`]s against the real GitHub API. Errors are
//! categorized transient/permanent via [`GitHubApiError::from_octocrab`];
//! nothing here retries — a failed delivery surfaces as HTTP 500 and the
//! webhook sender redelivers.

use serde::Serialize;

use crate::effects::{CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{CheckRunId, CheckRunResult, CommentId, LabelEntry, PrNumber, PullRequestRef, Sha};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::BranchExists { branch } => branch_exists(client, branch).await,
        GitHubEffect::FindPrByHead { branch } => find_pr_by_head(client, branch).await,
        GitHubEffect::FindOpenPrForCommit { sha } => find_open_pr_for_commit(client, sha).await,
        GitHubEffect::ListComments { pr } => list_comments(client, pr).await,
        GitHubEffect::ListLabels { pr } => list_labels(client, pr).await,
        GitHubEffect::CreatePr {
            head_branch,
            base_branch,
            title,
            body,
        } => create_pr(client, head_branch, base_branch, title, body).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
        GitHubEffect::AddLabels { pr, labels } => add_labels(client, pr, labels).await,
        GitHubEffect::RemoveLabel { pr, label } => remove_label(client, pr, label).await,
        GitHubEffect::DeleteBranch { branch } => delete_branch(client, branch).await,
        GitHubEffect::CreateCheckRun {
            name,
            head_sha,
            result,
        } => create_check_run(client, name, head_sha, result).await,
    }
}

/// Converts an octocrab PR model into our snapshot type.
fn pull_to_ref(pull: octocrab::models::pulls::PullRequest) -> Result<PullRequestRef, GitHubApiError> {
    let head_sha = Sha::parse(&pull.head.sha).map_err(|e| {
        GitHubApiError::permanent_without_source(format!("Invalid head SHA: {}", e))
    })?;
    let merge_commit_sha = match &pull.merge_commit_sha {
        // Test-merge SHAs on unmerged PRs parse the same way.
        Some(sha) => Some(Sha::parse(sha).map_err(|e| {
            GitHubApiError::permanent_without_source(format!("Invalid merge commit SHA: {}", e))
        })?),
        None => None,
    };

    Ok(PullRequestRef {
        number: PrNumber(pull.number),
        title: pull.title.unwrap_or_default(),
        body: pull.body.unwrap_or_default(),
        author: pull.user.map(|user| user.login).unwrap_or_default(),
        base_branch: pull.base.ref_field,
        head_branch: pull.head.ref_field,
        head_sha,
        labels: pull
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| LabelEntry {
                name: label.name,
                description: label.description,
            })
            .collect(),
        merged: pull.merged_at.is_some(),
        merge_commit_sha,
    })
}

// ─── PR Operations ────────────────────────────────────────────────────────────

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await;

    match result {
        Ok(pull) => Ok(GitHubResponse::Pr(pull_to_ref(pull)?)),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn find_pr_by_head(
    client: &OctocrabClient,
    branch: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let head = format!("{}:{}", client.owner(), branch);
    let result = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .list()
        .state(octocrab::params::State::All)
        .head(head)
        .per_page(1)
        .send()
        .await;

    match result {
        Ok(page) => match page.items.into_iter().next() {
            Some(pull) => Ok(GitHubResponse::PrSearch(Some(pull_to_ref(pull)?))),
            None => Ok(GitHubResponse::PrSearch(None)),
        },
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn find_open_pr_for_commit(
    client: &OctocrabClient,
    sha: Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let query = format!(
        "type:pr repo:{}/{} sha:{} is:open",
        client.owner(),
        client.repo_name(),
        sha
    );
    let result = client
        .inner()
        .search()
        .issues_and_pull_requests(&query)
        .sort("updated")
        .order("desc")
        .send()
        .await;

    let number = match result {
        Ok(page) => match page.items.into_iter().next() {
            Some(item) => PrNumber(item.number as u64),
            None => return Ok(GitHubResponse::PrSearch(None)),
        },
        Err(e) => return Err(GitHubApiError::from_octocrab(e)),
    };

    // The search result lacks PR fields (base branch, merge state), so fetch
    // the full record.
    match get_pr(client, number).await? {
        GitHubResponse::Pr(pr) => Ok(GitHubResponse::PrSearch(Some(pr))),
        other => Err(GitHubApiError::permanent_without_source(format!(
            "unexpected response to PR fetch: {:?}",
            other
        ))),
    }
}

async fn create_pr(
    client: &OctocrabClient,
    head_branch: String,
    base_branch: String,
    title: String,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .create(title, head_branch, base_branch)
        .body(body)
        .send()
        .await;

    match result {
        Ok(pull) => Ok(GitHubResponse::Pr(pull_to_ref(pull)?)),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Branch Operations ────────────────────────────────────────────────────────

async fn branch_exists(
    client: &OctocrabClient,
    branch: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .repos(client.owner(), client.repo_name())
        .get_ref(&octocrab::params::repos::Reference::Branch(branch))
        .await;

    match result {
        Ok(_) => Ok(GitHubResponse::BranchExists(true)),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                Ok(GitHubResponse::BranchExists(false))
            } else {
                Err(err)
            }
        }
    }
}

async fn delete_branch(
    client: &OctocrabClient,
    branch: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .repos(client.owner(), client.repo_name())
        .delete_ref(&octocrab::params::repos::Reference::Branch(branch))
        .await;

    match result {
        Ok(()) => Ok(GitHubResponse::BranchDeleted),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            // Already deleted: GitHub answers 422 "Reference does not exist".
            if err.is_not_found() || err.message.contains("Reference does not exist") {
                Ok(GitHubResponse::BranchDeleted)
            } else {
                Err(err)
            }
        }
    }
}

// ─── Comments ─────────────────────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await;

    match result {
        Ok(comment) => Ok(GitHubResponse::CommentPosted {
            id: CommentId(comment.id.into_inner()),
        }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn list_comments(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut all_comments = Vec::new();

    loop {
        let result = client
            .inner()
            .issues(client.owner(), client.repo_name())
            .list_comments(pr.0)
            .per_page(100)
            .page(page)
            .send()
            .await;

        match result {
            Ok(page_result) => {
                let items = page_result.items;
                let is_last_page = items.len() < 100;

                for comment in items {
                    all_comments.push(CommentData {
                        id: CommentId(comment.id.into_inner()),
                        author: comment.user.login,
                        body: comment.body.unwrap_or_default(),
                    });
                }

                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(GitHubResponse::Comments(all_comments))
}

// ─── Labels ───────────────────────────────────────────────────────────────────

async fn list_labels(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let first_page = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .list_labels_for_issue(pr.0)
        .per_page(100)
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let labels = client
        .inner()
        .all_pages(first_page)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Labels(
        labels
            .into_iter()
            .map(|label| LabelEntry {
                name: label.name,
                description: label.description,
            })
            .collect(),
    ))
}

async fn add_labels(
    client: &OctocrabClient,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_labels(pr.0, &labels)
        .await;

    match result {
        Ok(_) => Ok(GitHubResponse::LabelsAdded),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn remove_label(
    client: &OctocrabClient,
    pr: PrNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .remove_label(pr.0, label)
        .await;

    match result {
        Ok(_) => Ok(GitHubResponse::LabelRemoved),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Check Runs ───────────────────────────────────────────────────────────────

async fn create_check_run(
    client: &OctocrabClient,
    name: String,
    head_sha: Sha,
    result: CheckRunResult,
) -> Result<GitHubResponse, GitHubApiError> {
    // The REST payload wants the conclusion and output inline, and octocrab's
    // checks handler doesn't cover completed-at-creation runs, so post the
    // request directly.
    let url = format!(
        "/repos/{}/{}/check-runs",
        client.owner(),
        client.repo_name()
    );

    #[derive(Serialize)]
    struct CheckRunRequest<'a> {
        name: &'a str,
        head_sha: &'a str,
        status: &'static str,
        conclusion: &'a crate::types::CheckRunConclusion,
        output: &'a crate::types::CheckRunOutput,
    }

    let request = CheckRunRequest {
        name: &name,
        head_sha: head_sha.as_str(),
        status: "completed",
        conclusion: &result.conclusion,
        output: &result.output,
    };

    let response: Result<serde_json::Value, _> = client.inner().post(&url, Some(&request)).await;

    match response {
        Ok(value) => {
            let id = value
                .get("id")
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| {
                    GitHubApiError::permanent_without_source(
                        "check-run creation response missing id",
                    )
                })?;
            Ok(GitHubResponse::CheckRunCreated {
                id: CheckRunId(id),
            })
        }
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}
