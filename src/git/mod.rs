//! Local git operations for backport replays.
//!
//! The bot keeps one full clone of the repository and replays merged commits
//! onto maintenance branches in it (fetch, branch, cherry-pick, push). All
//! commands run with a clean environment (no system/user config) so behavior
//! is identical across machines, and commit identity is passed per-command
//! via `-c` flags.

pub mod backport;

use std::path::Path;
use std::process::Output;

use thiserror::Error;

use crate::types::{RepoId, Sha};

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Invalid SHA format.
    #[error("invalid SHA: {0}")]
    InvalidSha(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking git task was cancelled before completing.
    #[error("git task was cancelled: {0}")]
    TaskJoin(String),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Identity used for creating commits.
///
/// Passed via `-c` flags to git commands, so commits work with global and
/// system git config disabled and no per-repo `.git/config` edits.
#[derive(Debug, Clone)]
pub struct CommitIdentity {
    /// The committer/author name (git `user.name`).
    pub name: String,

    /// The committer/author email (git `user.email`).
    pub email: String,
}

/// Create a git Command with clean environment (no system/user config).
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    // Disable system and user config for reproducible behavior
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");

    // Disable terminal prompts
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Create a git Command configured for commit operations.
///
/// Extends [`git_command`] with `-c user.name=...` / `-c user.email=...`;
/// cherry-pick needs an identity to create the replayed commit.
pub(crate) fn git_commit_command(
    workdir: &Path,
    identity: &CommitIdentity,
) -> std::process::Command {
    let mut cmd = git_command(workdir);

    cmd.arg("-c");
    cmd.arg(format!("user.name={}", identity.name));
    cmd.arg("-c");
    cmd.arg(format!("user.email={}", identity.email));

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a GitError on failure.
pub fn run_git_sync(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output()?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a string.
pub fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git_sync(workdir, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Get the SHA of a revision.
pub fn rev_parse(workdir: &Path, rev: &str) -> GitResult<Sha> {
    let sha_str = run_git_stdout(workdir, &["rev-parse", rev])?;
    Sha::parse(&sha_str).map_err(|_| GitError::InvalidSha(sha_str))
}

/// Fetch refs from origin.
pub fn fetch(workdir: &Path, refspecs: &[&str]) -> GitResult<()> {
    let mut args = vec!["fetch", "origin"];
    args.extend(refspecs);
    run_git_sync(workdir, &args)?;
    Ok(())
}

/// Checkout a target in detached HEAD mode.
pub fn checkout_detached(workdir: &Path, target: &str) -> GitResult<()> {
    run_git_sync(workdir, &["checkout", "--detach", target])?;
    Ok(())
}

/// Ensure a clone of `repo` exists at `dir`, cloning it if absent.
///
/// `token` is embedded in the remote URL so fetches and pushes authenticate
/// without credential helpers.
pub fn ensure_clone(dir: &Path, repo: &RepoId, token: &str) -> GitResult<()> {
    if dir.join(".git").exists() {
        return Ok(());
    }
    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let url = format!(
        "https://x-access-token:{}@github.com/{}/{}.git",
        token, repo.owner, repo.repo
    );
    let dir_str = dir.to_string_lossy();
    // Run from the parent so the clone lands exactly at `dir`.
    let cwd = dir.parent().unwrap_or_else(|| Path::new("."));
    run_git_sync(cwd, &["clone", &url, &dir_str])?;
    Ok(())
}
