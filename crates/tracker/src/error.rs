//! Error types for the tracker crate.

use thiserror::Error;

/// Errors that can occur when talking to the hosting platform.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned a non-success status
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A response body did not match the expected shape
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// Both the primary and the fallback read strategy failed
    #[error("{operation} failed: primary: {primary}; fallback: {fallback}")]
    FallbackExhausted {
        operation: &'static str,
        primary: String,
        fallback: String,
    },
}
