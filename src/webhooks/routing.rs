//! Event classifier.
//!
//! Maps a parsed event to the ordered list of handlers that should run for
//! it. Routing is table-driven: one row per (action set, handler) pair, with
//! a per-handler predicate over the payload for the cheap checks that decide
//! applicability without any API call. Deeper checks (label parsing, check-run
//! name matching, API lookups) belong to the handlers themselves.

use crate::config::{BotConfig, FeatureFlags};
use crate::webhooks::events::{GitHubEvent, PrAction, PullRequestEvent};

/// The handlers a delivery can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Backport,
    TitleCheck,
    BlockedLabels,
    BackportLinks,
    Changelog,
    BranchCleanup,
}

impl Handler {
    fn enabled(self, features: &FeatureFlags) -> bool {
        match self {
            Handler::Backport => features.backport,
            Handler::TitleCheck => features.title_check,
            Handler::BlockedLabels => features.blocked_labels,
            Handler::BackportLinks => features.backport_bookkeeping,
            Handler::Changelog => features.changelog,
            Handler::BranchCleanup => features.branch_cleanup,
        }
    }

    /// Payload-only applicability check for `pull_request` rows.
    fn applies(self, event: &PullRequestEvent, config: &BotConfig) -> bool {
        match self {
            Handler::Backport => event.pr.merged,
            Handler::TitleCheck => {
                config.is_maintenance_branch(&event.pr.base_branch)
                    && (event.action != PrAction::Edited || event.title_changed)
            }
            Handler::BlockedLabels => !event.pr.merged,
            Handler::BackportLinks => {
                event.action != PrAction::Edited || event.title_changed
            }
            Handler::Changelog => {
                event.pr.merged && event.pr.base_branch == config.development_branch
            }
            Handler::BranchCleanup => event.pr.author == config.bot_login,
        }
    }
}

/// (actions that match, handler to run) — in invocation order.
const PR_ROUTES: &[(&[PrAction], Handler)] = &[
    (&[PrAction::Closed, PrAction::Labeled], Handler::Backport),
    (
        &[
            PrAction::Opened,
            PrAction::Reopened,
            PrAction::Edited,
            PrAction::Synchronize,
        ],
        Handler::TitleCheck,
    ),
    (
        &[
            PrAction::Opened,
            PrAction::Reopened,
            PrAction::Synchronize,
            PrAction::Labeled,
            PrAction::Unlabeled,
        ],
        Handler::BlockedLabels,
    ),
    (&[PrAction::Opened, PrAction::Edited], Handler::BackportLinks),
    (&[PrAction::Closed], Handler::Changelog),
    (&[PrAction::Closed], Handler::BranchCleanup),
];

/// Handlers that re-run their check on `check_run` `rerequested`. Each one
/// still matches the check-run name against its own before doing anything.
const CHECK_RUN_ROUTES: &[Handler] = &[Handler::TitleCheck, Handler::BlockedLabels];

/// Returns the handlers to invoke for `event`, in table order.
pub fn classify(event: &GitHubEvent, config: &BotConfig) -> Vec<Handler> {
    match event {
        GitHubEvent::PullRequest(event) => PR_ROUTES
            .iter()
            .filter(|(actions, _)| actions.contains(&event.action))
            .map(|(_, handler)| *handler)
            .filter(|handler| handler.enabled(&config.features))
            .filter(|handler| handler.applies(event, config))
            .collect(),
        GitHubEvent::CheckRun(_) => CHECK_RUN_ROUTES
            .iter()
            .copied()
            .filter(|handler| handler.enabled(&config.features))
            .collect(),
        GitHubEvent::Ping(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrNumber, PullRequestRef, RepoId, Sha};
    use crate::webhooks::events::{CheckRunEvent, PingEvent};
    use crate::types::CheckRunId;

    fn config() -> BotConfig {
        let mut maintenance_branches = std::collections::BTreeMap::new();
        maintenance_branches.insert("3.x".to_string(), "V3/3.x".to_string());
        maintenance_branches.insert("3.4".to_string(), "V3/3.4".to_string());
        BotConfig {
            repository: RepoId::new("example", "widget"),
            development_branch: "V3/develop".to_string(),
            bot_login: "widget-backport-bot".to_string(),
            maintenance_branches,
            labels: Default::default(),
            features: Default::default(),
            git_dir: "data/repo".into(),
        }
    }

    fn pr_event(action: PrAction) -> PullRequestEvent {
        PullRequestEvent {
            repo: RepoId::new("example", "widget"),
            action,
            pr: PullRequestRef {
                number: PrNumber(120),
                title: "Fix the widget".to_string(),
                body: String::new(),
                author: "alice".to_string(),
                base_branch: "V3/develop".to_string(),
                head_branch: "fix-widget".to_string(),
                head_sha: Sha::parse(&"a".repeat(40)).unwrap(),
                labels: vec![],
                merged: false,
                merge_commit_sha: None,
            },
            label: None,
            title_changed: false,
            sender: "alice".to_string(),
        }
    }

    #[test]
    fn merged_close_routes_to_backport_and_changelog() {
        let mut event = pr_event(PrAction::Closed);
        event.pr.merged = true;
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::Backport, Handler::Changelog]);
    }

    #[test]
    fn unmerged_close_routes_nowhere() {
        let event = pr_event(PrAction::Closed);
        // Not merged: no backport, no changelog; author is not the bot.
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert!(handlers.is_empty());
    }

    #[test]
    fn bot_authored_close_routes_to_janitor() {
        let mut event = pr_event(PrAction::Closed);
        event.pr.author = "widget-backport-bot".to_string();
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::BranchCleanup]);
    }

    #[test]
    fn synchronize_on_maintenance_pr_routes_to_both_reporters() {
        let mut event = pr_event(PrAction::Synchronize);
        event.pr.base_branch = "V3/3.x".to_string();
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::TitleCheck, Handler::BlockedLabels]);
    }

    #[test]
    fn synchronize_on_development_pr_skips_title_check() {
        let event = pr_event(PrAction::Synchronize);
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::BlockedLabels]);
    }

    #[test]
    fn edited_without_title_change_skips_title_sensitive_handlers() {
        let mut event = pr_event(PrAction::Edited);
        event.pr.base_branch = "V3/3.x".to_string();
        let handlers = classify(&GitHubEvent::PullRequest(event.clone()), &config());
        assert!(handlers.is_empty());

        event.title_changed = true;
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::TitleCheck, Handler::BackportLinks]);
    }

    #[test]
    fn labeled_on_merged_pr_routes_to_backport_only() {
        let mut event = pr_event(PrAction::Labeled);
        event.pr.merged = true;
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::Backport]);
    }

    #[test]
    fn labeled_on_open_pr_routes_to_blocked_reporter() {
        let event = pr_event(PrAction::Labeled);
        let handlers = classify(&GitHubEvent::PullRequest(event), &config());
        assert_eq!(handlers, vec![Handler::BlockedLabels]);
    }

    #[test]
    fn disabled_feature_removes_its_rows() {
        let mut config = config();
        config.features.blocked_labels = false;
        let event = pr_event(PrAction::Labeled);
        let handlers = classify(&GitHubEvent::PullRequest(event), &config);
        assert!(handlers.is_empty());
    }

    #[test]
    fn check_run_routes_to_both_reporters() {
        let event = GitHubEvent::CheckRun(CheckRunEvent {
            repo: RepoId::new("example", "widget"),
            check_run_id: CheckRunId(1),
            check_run_name: "Blocked status".to_string(),
            head_sha: Sha::parse(&"a".repeat(40)).unwrap(),
            pull_requests: vec![],
            sender: "alice".to_string(),
        });
        let handlers = classify(&event, &config());
        assert_eq!(handlers, vec![Handler::TitleCheck, Handler::BlockedLabels]);
    }

    #[test]
    fn ping_routes_nowhere() {
        let event = GitHubEvent::Ping(PingEvent { repo: None });
        assert!(classify(&event, &config()).is_empty());
    }
}
