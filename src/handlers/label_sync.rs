//! Label synchronization between a PR and its backports.
//!
//! Copies the copyable labels (type and release indicators) from a source PR
//! to a target PR. Backport-request, blocking, and changelog labels stay put:
//! they describe the source PR, not its backports.

use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::{LabelConventions, PrNumber, PullRequestRef, parse_label};

use super::{HandlerError, add_labels, list_labels};

/// Copies `source`'s copyable labels onto `target`, skipping any it already
/// has. Returns the number of labels added.
pub(crate) async fn copy_labels<G>(
    github: &G,
    conventions: &LabelConventions,
    source: &PullRequestRef,
    target: PrNumber,
) -> Result<usize, HandlerError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let mut wanted: Vec<&str> = Vec::new();
    for label in &source.labels {
        if parse_label(conventions, &label.name).is_copyable()
            && !wanted.contains(&label.name.as_str())
        {
            wanted.push(&label.name);
        }
    }
    if wanted.is_empty() {
        return Ok(0);
    }

    let current = list_labels(github, target).await?;
    let missing: Vec<String> = wanted
        .into_iter()
        .filter(|name| !current.iter().any(|l| l.name == *name))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        tracing::debug!(%target, "all copyable labels already present");
        return Ok(0);
    }

    let count = missing.len();
    tracing::info!(source = %source.number, %target, labels = ?missing, "copying labels");
    add_labels(github, target, missing).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeGitHub, pull_request};
    use crate::types::LabelEntry;

    fn conventions() -> LabelConventions {
        LabelConventions::default()
    }

    #[tokio::test]
    async fn copies_type_and_release_labels_only() {
        let github = FakeGitHub::new();
        let source = pull_request(
            120,
            "Fix the widget",
            vec![
                LabelEntry::new("Type: Bug"),
                LabelEntry::new("Release Blocker"),
                LabelEntry::new("Needs Backport To 3.x"),
                LabelEntry::new("Blocked"),
                LabelEntry::new("Changelog Entry: Added"),
                LabelEntry::new("documentation"),
            ],
        );
        let target = pull_request(121, "[3.x] Fix the widget (#120)", vec![]);
        github.add_pr(target.clone());

        let added = copy_labels(&github, &conventions(), &source, target.number)
            .await
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(
            github.label_names(target.number),
            vec!["Type: Bug", "Release Blocker"]
        );
    }

    #[tokio::test]
    async fn no_copyable_labels_means_no_api_calls() {
        let github = FakeGitHub::new();
        let source = pull_request(
            120,
            "Fix the widget",
            vec![LabelEntry::new("Needs Backport To 3.x")],
        );

        let added = copy_labels(&github, &conventions(), &source, PrNumber(121))
            .await
            .unwrap();

        assert_eq!(added, 0);
        assert!(github.effects().is_empty());
    }

    #[tokio::test]
    async fn labels_already_present_are_not_re_added() {
        let github = FakeGitHub::new();
        let source = pull_request(
            120,
            "Fix the widget",
            vec![
                LabelEntry::new("Type: Bug"),
                LabelEntry::new("High Priority"),
            ],
        );
        let target = pull_request(
            121,
            "[3.x] Fix the widget (#120)",
            vec![LabelEntry::new("Type: Bug")],
        );
        github.add_pr(target.clone());

        let added = copy_labels(&github, &conventions(), &source, target.number)
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(
            github.label_names(target.number),
            vec!["Type: Bug", "High Priority"]
        );
    }

    #[tokio::test]
    async fn duplicate_source_labels_are_copied_once() {
        let github = FakeGitHub::new();
        let source = pull_request(
            120,
            "Fix the widget",
            vec![LabelEntry::new("Type: Bug"), LabelEntry::new("Type: Bug")],
        );
        let target = pull_request(121, "[3.x] Fix the widget (#120)", vec![]);
        github.add_pr(target.clone());

        let added = copy_labels(&github, &conventions(), &source, target.number)
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(github.label_names(target.number), vec!["Type: Bug"]);
    }
}
