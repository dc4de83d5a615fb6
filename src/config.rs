//! Bot configuration.
//!
//! All behavior knobs live in one [`BotConfig`] value, loaded from a TOML file
//! at startup and threaded explicitly into every handler invocation. Nothing
//! reads ambient global state, so tests can substitute any configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{LabelConventions, RepoId, VersionMarker};

/// Errors from loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Per-feature enable flags.
///
/// One flag per handler, all on by default. A disabled feature's rows are
/// skipped by the event classifier, so the handler is never invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub backport: bool,
    pub title_check: bool,
    pub blocked_labels: bool,
    pub backport_bookkeeping: bool,
    pub changelog: bool,
    pub branch_cleanup: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags {
            backport: true,
            title_check: true,
            blocked_labels: true,
            backport_bookkeeping: true,
            changelog: true,
            branch_cleanup: true,
        }
    }
}

/// The bot's complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Repository this bot serves; deliveries for any other repository are
    /// acknowledged and ignored.
    pub repository: RepoId,

    /// The main development branch. PRs merged here are eligible for
    /// changelog-entry labelling.
    #[serde(default = "default_development_branch")]
    pub development_branch: String,

    /// Login of the bot's own account, i.e. the author of backport PRs.
    #[serde(default = "default_bot_login")]
    pub bot_login: String,

    /// Version marker to maintenance branch, e.g. "3.x" -> "V3/3.x".
    pub maintenance_branches: BTreeMap<String, String>,

    /// Label naming conventions.
    #[serde(default)]
    pub labels: LabelConventions,

    /// Per-feature enable flags.
    #[serde(default)]
    pub features: FeatureFlags,

    /// Local directory holding the bot's clone of the repository.
    #[serde(default = "default_git_dir")]
    pub git_dir: PathBuf,
}

fn default_development_branch() -> String {
    "V3/develop".to_string()
}

fn default_bot_login() -> String {
    "backport-bot".to_string()
}

fn default_git_dir() -> PathBuf {
    PathBuf::from("data/repo")
}

impl BotConfig {
    /// Loads and validates the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BotConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.owner.is_empty() || self.repository.repo.is_empty() {
            return Err(ConfigError::Invalid(
                "repository owner and name must be non-empty".to_string(),
            ));
        }
        if self.development_branch.is_empty() {
            return Err(ConfigError::Invalid(
                "development_branch must be non-empty".to_string(),
            ));
        }
        for (marker, branch) in &self.maintenance_branches {
            if marker.is_empty() || branch.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "maintenance_branches entry {marker:?} -> {branch:?} must be non-empty"
                )));
            }
        }
        Ok(())
    }

    /// The maintenance branch a version marker maps to.
    pub fn branch_for_marker(&self, marker: &VersionMarker) -> Option<&str> {
        self.maintenance_branches
            .get(marker.as_str())
            .map(String::as_str)
    }

    /// The version marker whose maintenance branch is `branch`.
    pub fn marker_for_branch(&self, branch: &str) -> Option<VersionMarker> {
        self.maintenance_branches
            .iter()
            .find(|(_, b)| b.as_str() == branch)
            .map(|(m, _)| VersionMarker::new(m.as_str()))
    }

    /// True if `branch` is one of the configured maintenance branches.
    pub fn is_maintenance_branch(&self, branch: &str) -> bool {
        self.maintenance_branches.values().any(|b| b == branch)
    }

    /// All configured version markers.
    pub fn markers(&self) -> impl Iterator<Item = VersionMarker> + '_ {
        self.maintenance_branches
            .keys()
            .map(|m| VersionMarker::new(m.as_str()))
    }
}
