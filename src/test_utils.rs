//! In-memory fakes and fixtures for handler tests.
//!
//! [`FakeGitHub`] is a stateful interpreter: mutations change its maps the
//! way the real API would, so idempotency tests can run a handler twice and
//! assert nothing doubled. [`FakeGit`] records replays and answers from a
//! scripted queue.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use crate::config::BotConfig;
use crate::effects::{
    CommentData, GitEffect, GitHubEffect, GitHubInterpreter, GitHubResponse, GitInterpreter,
    GitResponse,
};
use crate::git::GitError;
use crate::github::{GitHubApiError, GitHubErrorKind};
use crate::types::{
    CheckRunId, CheckRunResult, CommentId, LabelEntry, PrNumber, PullRequestRef, RepoId, Sha,
};
use crate::webhooks::events::{PrAction, PullRequestEvent};

pub const BOT_LOGIN: &str = "widget-backport-bot";

/// The configuration every handler test runs under.
pub fn test_config() -> BotConfig {
    BotConfig {
        repository: RepoId::new("example", "widget"),
        development_branch: "V3/develop".to_string(),
        bot_login: BOT_LOGIN.to_string(),
        maintenance_branches: BTreeMap::from([
            ("3.x".to_string(), "V3/3.x".to_string()),
            ("3.4".to_string(), "V3/3.4".to_string()),
        ]),
        labels: Default::default(),
        features: Default::default(),
        git_dir: "data/repo".into(),
    }
}

/// A SHA made of one repeated hex digit.
pub fn sha(digit: char) -> Sha {
    Sha::parse(&digit.to_string().repeat(40)).unwrap()
}

/// A PR snapshot with test defaults: authored by alice against the
/// development branch, head SHA derived from the number.
pub fn pull_request(number: u64, title: &str, labels: Vec<LabelEntry>) -> PullRequestRef {
    PullRequestRef {
        number: PrNumber(number),
        title: title.to_string(),
        body: String::new(),
        author: "alice".to_string(),
        base_branch: "V3/develop".to_string(),
        head_branch: format!("feature-{number}"),
        head_sha: Sha::parse(&format!("{number:040x}")).unwrap(),
        labels,
        merged: false,
        merge_commit_sha: None,
    }
}

pub fn pr_event(action: PrAction, pr: PullRequestRef) -> PullRequestEvent {
    PullRequestEvent {
        repo: RepoId::new("example", "widget"),
        action,
        pr,
        label: None,
        title_changed: false,
        sender: "alice".to_string(),
    }
}

/// A `closed` delivery for a PR merged into the development branch.
pub fn merged_pr_event(number: u64, title: &str, labels: Vec<LabelEntry>) -> PullRequestEvent {
    let mut pr = pull_request(number, title, labels);
    pr.merged = true;
    pr.merge_commit_sha = Some(sha('b'));
    pr_event(PrAction::Closed, pr)
}

fn not_found(message: impl Into<String>) -> GitHubApiError {
    GitHubApiError {
        kind: GitHubErrorKind::Permanent,
        status_code: Some(404),
        message: message.into(),
        source: None,
    }
}

#[derive(Default)]
struct FakeGitHubState {
    prs: BTreeMap<PrNumber, PullRequestRef>,
    comments: BTreeMap<PrNumber, Vec<CommentData>>,
    branches: BTreeSet<String>,
    check_runs: Vec<(String, Sha, CheckRunResult)>,
    created: Vec<PrNumber>,
    effects: Vec<GitHubEffect>,
    next_pr: u64,
    next_comment: u64,
}

/// Stateful in-memory stand-in for the GitHub API.
pub struct FakeGitHub {
    state: Mutex<FakeGitHubState>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        FakeGitHub {
            state: Mutex::new(FakeGitHubState {
                next_pr: 1000,
                next_comment: 1,
                ..Default::default()
            }),
        }
    }

    pub fn add_pr(&self, pr: PullRequestRef) {
        self.state.lock().unwrap().prs.insert(pr.number, pr);
    }

    pub fn add_branch(&self, name: &str) {
        self.state.lock().unwrap().branches.insert(name.to_string());
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        self.state.lock().unwrap().branches.contains(name)
    }

    /// Every effect interpreted so far, in order.
    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.state.lock().unwrap().effects.clone()
    }

    pub fn comment_bodies(&self, pr: PrNumber) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&pr)
            .map(|comments| comments.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn label_names(&self, pr: PrNumber) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .prs
            .get(&pr)
            .map(|pr| pr.labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default()
    }

    /// PRs opened through `CreatePr`, in creation order.
    pub fn created_prs(&self) -> Vec<PullRequestRef> {
        let state = self.state.lock().unwrap();
        state
            .created
            .iter()
            .filter_map(|n| state.prs.get(n).cloned())
            .collect()
    }

    pub fn check_runs(&self) -> Vec<(String, Sha, CheckRunResult)> {
        self.state.lock().unwrap().check_runs.clone()
    }
}

impl GitHubInterpreter for FakeGitHub {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.effects.push(effect.clone());
        match effect {
            GitHubEffect::GetPr { pr } => state
                .prs
                .get(&pr)
                .cloned()
                .map(GitHubResponse::Pr)
                .ok_or_else(|| not_found(format!("no such PR: {pr}"))),
            GitHubEffect::BranchExists { branch } => Ok(GitHubResponse::BranchExists(
                state.branches.contains(&branch),
            )),
            GitHubEffect::FindPrByHead { branch } => Ok(GitHubResponse::PrSearch(
                state
                    .prs
                    .values()
                    .find(|pr| pr.head_branch == branch)
                    .cloned(),
            )),
            GitHubEffect::FindOpenPrForCommit { sha } => Ok(GitHubResponse::PrSearch(
                state
                    .prs
                    .values()
                    .find(|pr| !pr.merged && pr.head_sha == sha)
                    .cloned(),
            )),
            GitHubEffect::ListComments { pr } => Ok(GitHubResponse::Comments(
                state.comments.get(&pr).cloned().unwrap_or_default(),
            )),
            GitHubEffect::ListLabels { pr } => state
                .prs
                .get(&pr)
                .map(|pr| GitHubResponse::Labels(pr.labels.clone()))
                .ok_or_else(|| not_found(format!("no such PR: {pr}"))),
            GitHubEffect::CreatePr {
                head_branch,
                base_branch,
                title,
                body,
            } => {
                state.next_pr += 1;
                let number = PrNumber(state.next_pr);
                let pr = PullRequestRef {
                    number,
                    title,
                    body,
                    author: BOT_LOGIN.to_string(),
                    base_branch,
                    head_branch,
                    head_sha: Sha::parse(&format!("{:040x}", state.next_pr)).unwrap(),
                    labels: Vec::new(),
                    merged: false,
                    merge_commit_sha: None,
                };
                state.prs.insert(number, pr.clone());
                state.created.push(number);
                Ok(GitHubResponse::Pr(pr))
            }
            GitHubEffect::PostComment { pr, body } => {
                state.next_comment += 1;
                let id = CommentId(state.next_comment);
                state.comments.entry(pr).or_default().push(CommentData {
                    id,
                    author: BOT_LOGIN.to_string(),
                    body,
                });
                Ok(GitHubResponse::CommentPosted { id })
            }
            GitHubEffect::AddLabels { pr, labels } => {
                let entry = state
                    .prs
                    .get_mut(&pr)
                    .ok_or_else(|| not_found(format!("no such PR: {pr}")))?;
                for name in labels {
                    if !entry.labels.iter().any(|l| l.name == name) {
                        entry.labels.push(LabelEntry::new(name));
                    }
                }
                Ok(GitHubResponse::LabelsAdded)
            }
            GitHubEffect::RemoveLabel { pr, label } => {
                let entry = state
                    .prs
                    .get_mut(&pr)
                    .ok_or_else(|| not_found(format!("no such PR: {pr}")))?;
                let before = entry.labels.len();
                entry.labels.retain(|l| l.name != label);
                if entry.labels.len() == before {
                    return Err(not_found(format!("label not on {pr}: {label}")));
                }
                Ok(GitHubResponse::LabelRemoved)
            }
            GitHubEffect::DeleteBranch { branch } => {
                state.branches.remove(&branch);
                Ok(GitHubResponse::BranchDeleted)
            }
            GitHubEffect::CreateCheckRun {
                name,
                head_sha,
                result,
            } => {
                state.check_runs.push((name, head_sha, result));
                Ok(GitHubResponse::CheckRunCreated {
                    id: CheckRunId(state.check_runs.len() as u64),
                })
            }
        }
    }
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Records replays and answers from a scripted queue.
///
/// An empty queue answers every replay with a clean result, so tests that
/// don't care about conflicts need no setup.
pub struct FakeGit {
    responses: Mutex<VecDeque<GitResponse>>,
    replays: Mutex<Vec<GitEffect>>,
}

impl FakeGit {
    pub fn new() -> Self {
        FakeGit {
            responses: Mutex::new(VecDeque::new()),
            replays: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the response to the next replay.
    pub fn queue_response(&self, response: GitResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn replays(&self) -> Vec<GitEffect> {
        self.replays.lock().unwrap().clone()
    }
}

impl Default for FakeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitInterpreter for FakeGit {
    type Error = GitError;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        self.replays.lock().unwrap().push(effect);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(GitResponse::Replayed { head: sha('d') }))
    }
}
