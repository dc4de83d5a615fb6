//! GitHub API error types.
//!
//! Every API error carries a kind distinguishing transient from permanent
//! failures. The bot never retries in-process: a transient error propagates
//! as a failed delivery (HTTP 500) and the webhook sender redelivers, which
//! the idempotency guards make safe. Permanent errors also fail the delivery
//! but indicate something redelivery will not fix.

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Transient error - expected to resolve on redelivery.
    ///
    /// Examples:
    /// - HTTP 5xx (server errors)
    /// - HTTP 429 (rate limited)
    /// - HTTP 403 with rate limit messages
    /// - Network timeouts
    Transient,

    /// Permanent error - redelivery will fail the same way.
    ///
    /// Examples:
    /// - Most HTTP 4xx (not found, validation failures)
    /// - Authentication failures (401, 403 non-rate-limit)
    Permanent,
}

impl GitHubErrorKind {
    /// True if redelivering the event is expected to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A GitHub API error with transient/permanent categorization.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The kind of error.
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error by status code and message patterns.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = Self::extract_status_code(&err);
        let message = err.to_string();

        let kind = match status_code {
            Some(429) => GitHubErrorKind::Transient, // Rate limited
            Some(403) if is_rate_limit_error(&message) => GitHubErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
            Some(_) => GitHubErrorKind::Permanent,
            None => {
                // No status code - check if it's a network error
                if is_network_error(&message) {
                    GitHubErrorKind::Transient
                } else {
                    GitHubErrorKind::Permanent
                }
            }
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    /// True if the underlying failure was an HTTP 404.
    ///
    /// Used where absence is an answer rather than a failure (branch
    /// existence probes, idempotent branch deletion).
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }

    /// Extracts the HTTP status code from an octocrab error, if present.
    ///
    /// octocrab's `Error` type doesn't expose a stable status accessor across
    /// all variants, so this parses the message. The fallback (`None`) is
    /// safe: categorization then depends only on network-error sniffing.
    fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
        if let octocrab::Error::GitHub { source, .. } = err {
            return Some(source.status_code.as_u16());
        }

        let err_str = err.to_string();

        // octocrab formats HTTP-layer errors with "status: <code>"
        if let Some(idx) = err_str.find("status: ") {
            let rest = &err_str[idx + 8..];
            if let Some(end) = rest.find(|c: char| !c.is_ascii_digit()) {
                if let Ok(code) = rest[..end].parse() {
                    return Some(code);
                }
            } else if let Ok(code) = rest.trim().parse() {
                return Some(code);
            }
        }

        if err_str.contains("404") && err_str.to_lowercase().contains("not found") {
            return Some(404);
        }
        if err_str.contains("429") {
            return Some(429);
        }
        if err_str.contains("403") {
            return Some(403);
        }
        if err_str.contains("401") {
            return Some(401);
        }

        None
    }
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detection() {
        assert!(is_rate_limit_error("API rate limit exceeded"));
        assert!(is_rate_limit_error("secondary rate limit"));
        assert!(is_rate_limit_error("abuse detection mechanism"));
        assert!(!is_rate_limit_error("Permission denied"));
    }

    #[test]
    fn network_error_detection() {
        assert!(is_network_error("connection timeout"));
        assert!(is_network_error("DNS resolution failed"));
        assert!(is_network_error("request timed out"));
        assert!(!is_network_error("Not found"));
    }

    #[test]
    fn kind_classification() {
        assert!(GitHubErrorKind::Transient.is_transient());
        assert!(!GitHubErrorKind::Permanent.is_transient());
    }

    #[test]
    fn not_found_predicate() {
        let err = GitHubApiError {
            kind: GitHubErrorKind::Permanent,
            status_code: Some(404),
            message: "Not Found".to_string(),
            source: None,
        };
        assert!(err.is_not_found());
        assert!(!GitHubApiError::transient_without_source("timeout").is_not_found());
    }
}
