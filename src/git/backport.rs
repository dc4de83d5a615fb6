//! Cherry-pick replay onto maintenance branches.
//!
//! Implements [`GitInterpreter`] for the bot's local clone. A replay cuts a
//! fresh branch from the tip of the target maintenance branch, cherry-picks
//! the merged commit with `-x`, and pushes the branch. On conflict the
//! cherry-pick is aborted and the local branch discarded; nothing reaches
//! the server.
//!
//! The clone is the one shared local resource, so replays serialize on an
//! async mutex; the blocking git work runs under `spawn_blocking`.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::effects::{GitEffect, GitInterpreter, GitResponse};
use crate::types::Sha;

use super::{
    CommitIdentity, GitError, GitResult, checkout_detached, fetch, git_commit_command,
    rev_parse, run_git_stdout, run_git_sync,
};

/// Git interpreter that performs backport replays in a local clone.
#[derive(Debug)]
pub struct GitBackport {
    workdir: PathBuf,
    identity: CommitIdentity,
    lock: Mutex<()>,
}

impl GitBackport {
    pub fn new(workdir: PathBuf, identity: CommitIdentity) -> Self {
        Self {
            workdir,
            identity,
            lock: Mutex::new(()),
        }
    }
}

impl GitInterpreter for GitBackport {
    type Error = GitError;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        let GitEffect::Replay {
            commit,
            target_branch,
            new_branch,
        } = effect;

        let _guard = self.lock.lock().await;
        let workdir = self.workdir.clone();
        let identity = self.identity.clone();
        tokio::task::spawn_blocking(move || {
            replay_sync(&workdir, &identity, &commit, &target_branch, &new_branch)
        })
        .await
        .map_err(|e| GitError::TaskJoin(e.to_string()))?
    }
}

/// The blocking replay: fetch, branch, cherry-pick, push, clean up.
fn replay_sync(
    workdir: &Path,
    identity: &CommitIdentity,
    commit: &Sha,
    target_branch: &str,
    new_branch: &str,
) -> GitResult<GitResponse> {
    fetch(workdir, &[])?;

    // -B resets any leftover local branch from an earlier aborted replay.
    let start_point = format!("origin/{}", target_branch);
    run_git_sync(workdir, &["checkout", "-B", new_branch, &start_point])?;

    if let Err(err) = cherry_pick(workdir, identity, commit) {
        let files = conflicting_files(workdir)?;
        discard_local_branch(workdir, &start_point, new_branch);
        if files.is_empty() {
            // Not a content conflict (bad revision, empty commit, ...).
            return Err(err);
        }
        return Ok(GitResponse::Conflict { files });
    }

    let head = rev_parse(workdir, "HEAD")?;
    let refspec = format!("HEAD:refs/heads/{}", new_branch);
    let push_result = run_git_sync(workdir, &["push", "origin", &refspec]);
    discard_local_branch(workdir, &start_point, new_branch);
    push_result?;

    Ok(GitResponse::Replayed { head })
}

/// Cherry-pick `commit` with `-x`, falling back to `-m 1` for merge commits.
fn cherry_pick(workdir: &Path, identity: &CommitIdentity, commit: &Sha) -> GitResult<()> {
    let output = git_commit_command(workdir, identity)
        .args(["cherry-pick", "-x", commit.as_str()])
        .output()?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    if stderr.contains("is a merge but no -m option was given") {
        abort_cherry_pick(workdir);
        let output = git_commit_command(workdir, identity)
            .args(["cherry-pick", "-x", "-m", "1", commit.as_str()])
            .output()?;
        if output.status.success() {
            return Ok(());
        }
        return Err(GitError::CommandFailed {
            command: format!("git cherry-pick -x -m 1 {}", commit),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Err(GitError::CommandFailed {
        command: format!("git cherry-pick -x {}", commit),
        stderr,
    })
}

/// Files left unmerged by a failed cherry-pick.
fn conflicting_files(workdir: &Path) -> GitResult<Vec<String>> {
    // git diff --name-only --diff-filter=U lists unmerged files
    let stdout = run_git_stdout(workdir, &["diff", "--name-only", "--diff-filter=U"])?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn abort_cherry_pick(workdir: &Path) {
    if let Err(err) = run_git_sync(workdir, &["cherry-pick", "--abort"]) {
        tracing::debug!(error = %err, "cherry-pick --abort failed (nothing in progress?)");
    }
}

/// Leave the clone detached and drop the working branch. Best effort: a
/// failure here leaves clutter for the next `checkout -B` to reset.
fn discard_local_branch(workdir: &Path, detach_target: &str, branch: &str) {
    abort_cherry_pick(workdir);
    if let Err(err) = checkout_detached(workdir, detach_target) {
        tracing::warn!(error = %err, "failed to detach after replay");
        return;
    }
    if let Err(err) = run_git_sync(workdir, &["branch", "-D", branch]) {
        tracing::warn!(error = %err, branch, "failed to delete local replay branch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;

    struct Fixture {
        _tmp: tempfile::TempDir,
        origin: PathBuf,
        seed: PathBuf,
        clone: PathBuf,
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed in {:?}", args, dir);
    }

    fn commit(dir: &Path, message: &str) -> Sha {
        git(
            dir,
            &[
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@test.invalid",
                "commit",
                "-am",
                message,
            ],
        );
        rev_parse(dir, "HEAD").unwrap()
    }

    /// Origin with `develop` and `maintenance` branches sharing one root
    /// commit, plus a bot clone of it.
    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let origin = tmp.path().join("origin.git");
        let seed = tmp.path().join("seed");
        let clone = tmp.path().join("clone");

        fs::create_dir(&origin).unwrap();
        git(&origin, &["init", "--bare"]);

        fs::create_dir(&seed).unwrap();
        git(&seed, &["init", "--initial-branch=develop"]);
        fs::write(seed.join("base.txt"), "base\n").unwrap();
        git(&seed, &["add", "base.txt"]);
        commit(&seed, "initial");
        git(&seed, &["branch", "maintenance"]);
        git(&seed, &["remote", "add", "origin", origin.to_str().unwrap()]);
        git(&seed, &["push", "origin", "develop", "maintenance"]);

        git(
            tmp.path(),
            &["clone", origin.to_str().unwrap(), clone.to_str().unwrap()],
        );

        Fixture {
            _tmp: tmp,
            origin,
            seed,
            clone,
        }
    }

    fn backport(fixture: &Fixture) -> GitBackport {
        GitBackport::new(
            fixture.clone.clone(),
            CommitIdentity {
                name: "Backport Bot".to_string(),
                email: "bot@example.invalid".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn clean_replay_pushes_the_branch() {
        let fixture = fixture();

        // A develop-only commit that applies cleanly to maintenance.
        fs::write(fixture.seed.join("feature.txt"), "feature\n").unwrap();
        git(&fixture.seed, &["add", "feature.txt"]);
        let sha = commit(&fixture.seed, "add feature");
        git(&fixture.seed, &["push", "origin", "develop"]);

        let response = backport(&fixture)
            .interpret(GitEffect::Replay {
                commit: sha,
                target_branch: "maintenance".to_string(),
                new_branch: "backport-1-to-1.x".to_string(),
            })
            .await
            .unwrap();

        let GitResponse::Replayed { head } = response else {
            panic!("expected clean replay, got {response:?}");
        };
        // The pushed branch exists on origin and points at the replayed head.
        let pushed = rev_parse(&fixture.origin, "backport-1-to-1.x").unwrap();
        assert_eq!(pushed, head);
        // The replayed commit records its origin.
        let message = run_git_stdout(&fixture.origin, &["log", "-1", "--format=%B", "backport-1-to-1.x"])
            .unwrap();
        assert!(message.contains("cherry picked from commit"), "{message}");
    }

    #[tokio::test]
    async fn conflicting_replay_reports_files_and_pushes_nothing() {
        let fixture = fixture();

        // Diverge base.txt on both branches.
        git(&fixture.seed, &["checkout", "maintenance"]);
        fs::write(fixture.seed.join("base.txt"), "maintenance change\n").unwrap();
        commit(&fixture.seed, "maintenance edit");
        git(&fixture.seed, &["checkout", "develop"]);
        fs::write(fixture.seed.join("base.txt"), "develop change\n").unwrap();
        let sha = commit(&fixture.seed, "develop edit");
        git(&fixture.seed, &["push", "origin", "develop", "maintenance"]);

        let response = backport(&fixture)
            .interpret(GitEffect::Replay {
                commit: sha,
                target_branch: "maintenance".to_string(),
                new_branch: "backport-2-to-1.x".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            response,
            GitResponse::Conflict {
                files: vec!["base.txt".to_string()]
            }
        );
        assert!(rev_parse(&fixture.origin, "backport-2-to-1.x").is_err());
        // The clone is left clean for the next replay.
        let status = run_git_stdout(&fixture.clone, &["status", "--porcelain"]).unwrap();
        assert_eq!(status, "");
    }

    #[tokio::test]
    async fn replay_of_unknown_commit_is_an_error() {
        let fixture = fixture();

        let result = backport(&fixture)
            .interpret(GitEffect::Replay {
                commit: Sha::parse(&"f".repeat(40)).unwrap(),
                target_branch: "maintenance".to_string(),
                new_branch: "backport-3-to-1.x".to_string(),
            })
            .await;

        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }
}
