//! Git operation effect types.
//!
//! These types describe local git operations as data, without executing them.
//! The production interpreter runs them against the bot's clone of the
//! repository; tests script responses instead.

use serde::{Deserialize, Serialize};

use crate::types::Sha;

/// A git effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitEffect {
    /// Replay `commit` onto a fresh branch cut from the tip of
    /// `target_branch`, and push the branch on success.
    ///
    /// The cherry-pick records its origin with `-x`. On conflict the replay
    /// is aborted and the local branch discarded; nothing is pushed.
    Replay {
        commit: Sha,
        target_branch: String,
        new_branch: String,
    },
}

/// Response to a [`GitEffect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitResponse {
    /// The replay applied cleanly and the branch was pushed.
    Replayed { head: Sha },

    /// The cherry-pick hit conflicts; nothing was pushed.
    Conflict { files: Vec<String> },
}
