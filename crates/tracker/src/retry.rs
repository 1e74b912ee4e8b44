//! Read-fallback retry policy.
//!
//! Reads that have a documented alternate query method go through this
//! policy: the primary strategy runs once, and on failure the fallback
//! strategy runs exactly once with no backoff. If both fail the read is
//! fatal. Writes never go through this path.

use std::future::Future;
use tracing::warn;

use crate::error::TrackerError;

/// One-alternate-strategy retry policy for platform reads.
#[derive(Debug, Clone, Copy)]
pub struct ReadFallback {
    operation: &'static str,
}

impl ReadFallback {
    /// Create a policy for a named read operation.
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }

    /// Run the primary strategy, falling back once on failure.
    pub async fn run<T, P, F>(&self, primary: P, fallback: F) -> Result<T, TrackerError>
    where
        P: Future<Output = Result<T, TrackerError>>,
        F: Future<Output = Result<T, TrackerError>>,
    {
        let primary_err = match primary.await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        warn!(
            operation = self.operation,
            error = %primary_err,
            "Primary read strategy failed, trying fallback"
        );

        match fallback.await {
            Ok(value) => Ok(value),
            Err(fallback_err) => Err(TrackerError::FallbackExhausted {
                operation: self.operation,
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }
}
