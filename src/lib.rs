//! Backport bot - a GitHub bot automating maintenance-branch workflows.
//!
//! Backports merged PRs to their requested maintenance branches, enforces the
//! maintenance-branch title convention, reports blocked labels as check runs,
//! and keeps labels, cross-links, changelog markers, and backport branches
//! tidy.

pub mod config;
pub mod effects;
pub mod git;
pub mod github;
pub mod handlers;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
