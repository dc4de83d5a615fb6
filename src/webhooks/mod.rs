//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Parsing of raw payloads into typed events
//! - The event classifier that routes events to handlers

pub mod events;
pub mod parser;
pub mod routing;
pub mod signature;

pub use events::GitHubEvent;
pub use parser::{ParseError, parse_webhook};
pub use routing::{Handler, classify};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
