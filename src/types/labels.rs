//! Label vocabulary.
//!
//! Raw label names encode semantics by convention ("Needs Backport To 3.x"
//! carries both intent and target). [`parse_label`] is the single place those
//! strings are interpreted; everything downstream works with the tagged
//! [`Label`] variants and never re-parses.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Naming conventions that give label strings their meaning.
///
/// Part of the bot configuration; the defaults match the upstream repository's
/// label scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConventions {
    /// Prefix of backport-request labels; the remainder is the version marker.
    pub backport_prefix: String,

    /// Prefix of type labels ("Type: Bug", "Type: Enhancement").
    pub type_prefix: String,

    /// Prefixes of release-indicator labels. Matched with starts-with, so a
    /// bare name like "Release Blocker" also matches suffixed variants.
    pub release_indicators: Vec<String>,

    /// Exact names that mark a PR as blocked.
    pub blocking_names: Vec<String>,

    /// Prefixes that mark a PR as blocked ("Blocked By: #123").
    pub blocking_prefixes: Vec<String>,

    /// Prefix of changelog-entry labels; the remainder is the status.
    pub changelog_prefix: String,
}

impl Default for LabelConventions {
    fn default() -> Self {
        LabelConventions {
            backport_prefix: "Needs Backport To ".to_string(),
            type_prefix: "Type: ".to_string(),
            release_indicators: vec![
                "Release Blocker".to_string(),
                "High Priority".to_string(),
                "Breaking Change".to_string(),
            ],
            blocking_names: vec!["Blocked".to_string()],
            blocking_prefixes: vec!["Blocked By: ".to_string(), "Blocked: ".to_string()],
            changelog_prefix: "Changelog Entry: ".to_string(),
        }
    }
}

impl LabelConventions {
    /// The raw label name requesting a backport to `marker`.
    pub fn backport_label(&self, marker: &VersionMarker) -> String {
        format!("{}{}", self.backport_prefix, marker)
    }

    /// The raw label name for a changelog-entry status.
    pub fn changelog_label(&self, status: &str) -> String {
        format!("{}{}", self.changelog_prefix, status)
    }
}

/// A label name interpreted under [`LabelConventions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Requests a backport to the maintenance line identified by the marker.
    BackportRequest { target: VersionMarker },

    /// A type label; `kind` is the text after the prefix ("Bug").
    Type { kind: String },

    /// A release-indicator label ("Release Blocker", "High Priority", ...).
    ReleaseIndicator { name: String },

    /// A label that marks the PR as blocked.
    Blocking { name: String },

    /// A changelog-entry label; `status` is the text after the prefix.
    ChangelogEntry { status: String },

    /// Anything the conventions don't recognize.
    Other { name: String },
}

impl Label {
    /// True for labels the Label Synchronizer copies between PRs.
    pub fn is_copyable(&self) -> bool {
        matches!(self, Label::Type { .. } | Label::ReleaseIndicator { .. })
    }

    /// True for labels that mark a PR as blocked.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Label::Blocking { .. })
    }

    /// The backport target, if this is a backport-request label.
    pub fn backport_target(&self) -> Option<&VersionMarker> {
        match self {
            Label::BackportRequest { target } => Some(target),
            _ => None,
        }
    }
}

/// Interprets a raw label name under the given conventions.
///
/// Precedence follows specificity: backport requests first, then blocking,
/// type, release-indicator, and changelog labels. Unrecognized names fall
/// through to [`Label::Other`].
pub fn parse_label(conventions: &LabelConventions, raw: &str) -> Label {
    if let Some(rest) = raw.strip_prefix(&conventions.backport_prefix) {
        let target = VersionMarker::new(rest.trim());
        if !target.as_str().is_empty() {
            return Label::BackportRequest { target };
        }
    }

    if conventions.blocking_names.iter().any(|n| n == raw)
        || conventions
            .blocking_prefixes
            .iter()
            .any(|p| raw.starts_with(p.as_str()))
    {
        return Label::Blocking {
            name: raw.to_string(),
        };
    }

    if let Some(kind) = raw.strip_prefix(&conventions.type_prefix) {
        if !kind.is_empty() {
            return Label::Type {
                kind: kind.to_string(),
            };
        }
    }

    if conventions
        .release_indicators
        .iter()
        .any(|p| raw.starts_with(p.as_str()))
    {
        return Label::ReleaseIndicator {
            name: raw.to_string(),
        };
    }

    if let Some(status) = raw.strip_prefix(&conventions.changelog_prefix) {
        if !status.is_empty() {
            return Label::ChangelogEntry {
                status: status.to_string(),
            };
        }
    }

    Label::Other {
        name: raw.to_string(),
    }
}

/// The short identifier of a maintenance line ("3.x", "3.4").
///
/// Appears as the suffix of backport-request labels, the `[...]` prefix of
/// maintenance-branch PR titles, and in backport branch names. Ordering is by
/// numeric version components so multi-target backports can process the newest
/// line first; an "x" component sorts above any number in its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMarker(String);

impl VersionMarker {
    pub fn new(s: impl Into<String>) -> Self {
        VersionMarker(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The title prefix for PRs against this line's maintenance branch.
    pub fn title_prefix(&self) -> String {
        format!("[{}]", self.0)
    }

    fn components(&self) -> Vec<VersionComponent> {
        self.0.split('.').map(VersionComponent::parse).collect()
    }
}

impl fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VersionMarker {
    fn from(s: &str) -> Self {
        VersionMarker::new(s)
    }
}

impl Ord for VersionMarker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            // Tiebreak on the raw string so the order is total and stable.
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionMarker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One dot-separated component of a version marker.
///
/// Variant order gives the derived `Ord`: a wildcard ("x") outranks any
/// number, so "3.x" sorts above "3.9".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum VersionComponent {
    Number(u64),
    Wildcard,
}

impl VersionComponent {
    fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => VersionComponent::Number(n),
            Err(_) => VersionComponent::Wildcard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conventions() -> LabelConventions {
        LabelConventions::default()
    }

    mod parsing {
        use super::*;

        #[test]
        fn backport_request_carries_target() {
            let label = parse_label(&conventions(), "Needs Backport To 3.x");
            assert_eq!(
                label,
                Label::BackportRequest {
                    target: VersionMarker::new("3.x")
                }
            );
        }

        #[test]
        fn backport_prefix_alone_is_not_a_request() {
            let label = parse_label(&conventions(), "Needs Backport To ");
            assert_eq!(
                label,
                Label::Other {
                    name: "Needs Backport To ".to_string()
                }
            );
        }

        #[test]
        fn type_label() {
            let label = parse_label(&conventions(), "Type: Bug");
            assert_eq!(
                label,
                Label::Type {
                    kind: "Bug".to_string()
                }
            );
            assert!(label.is_copyable());
        }

        #[test]
        fn release_indicators_match_by_prefix() {
            for name in ["Release Blocker", "High Priority", "Breaking Change"] {
                let label = parse_label(&conventions(), name);
                assert_eq!(
                    label,
                    Label::ReleaseIndicator {
                        name: name.to_string()
                    }
                );
                assert!(label.is_copyable());
            }
        }

        #[test]
        fn blocking_exact_and_prefixed() {
            for name in ["Blocked", "Blocked By: #123", "Blocked: Needs Discussion"] {
                let label = parse_label(&conventions(), name);
                assert!(label.is_blocking(), "{name} should be blocking");
            }
        }

        #[test]
        fn blockers_is_not_blocking() {
            // Exact-match names must not behave like prefixes.
            let label = parse_label(&conventions(), "Blockers");
            assert!(!label.is_blocking());
        }

        #[test]
        fn changelog_entry_carries_status() {
            let label = parse_label(&conventions(), "Changelog Entry: Pending");
            assert_eq!(
                label,
                Label::ChangelogEntry {
                    status: "Pending".to_string()
                }
            );
        }

        #[test]
        fn unrecognized_is_other() {
            let label = parse_label(&conventions(), "documentation");
            assert_eq!(
                label,
                Label::Other {
                    name: "documentation".to_string()
                }
            );
            assert!(!label.is_copyable());
            assert!(!label.is_blocking());
        }

        proptest! {
            #[test]
            fn never_panics(raw in "\\PC{0,80}") {
                let _ = parse_label(&conventions(), &raw);
            }

            #[test]
            fn backport_label_roundtrip(marker in "[0-9]{1,3}(\\.[0-9x]{1,3}){0,2}") {
                let conv = conventions();
                let target = VersionMarker::new(&marker);
                let raw = conv.backport_label(&target);
                prop_assert_eq!(
                    parse_label(&conv, &raw),
                    Label::BackportRequest { target }
                );
            }
        }
    }

    mod marker_ordering {
        use super::*;

        fn m(s: &str) -> VersionMarker {
            VersionMarker::new(s)
        }

        #[test]
        fn numeric_components_compare_numerically() {
            assert!(m("3.5") > m("3.4"));
            assert!(m("3.10") > m("3.9"));
            assert!(m("4.0") > m("3.9"));
        }

        #[test]
        fn wildcard_outranks_numbers_in_its_line() {
            assert!(m("3.x") > m("3.9"));
            assert!(m("4.0") > m("3.x"));
        }

        #[test]
        fn descending_sort_puts_newest_first() {
            let mut markers = vec![m("3.3"), m("3.x"), m("3.4")];
            markers.sort_by(|a, b| b.cmp(a));
            let order: Vec<&str> = markers.iter().map(|v| v.as_str()).collect();
            assert_eq!(order, vec!["3.x", "3.4", "3.3"]);
        }

        #[test]
        fn title_prefix_is_bracketed() {
            assert_eq!(m("3.x").title_prefix(), "[3.x]");
        }
    }
}
