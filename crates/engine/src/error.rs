//! Error types for the eligibility engine.
//!
//! Policy rejections (validation, capacity, history bars) are not errors;
//! they are [`crate::orchestrator::Decision::Rejected`] values. Everything
//! here aborts the whole decision.

use thiserror::Error;
use tracker::TrackerError;

/// Fatal failures of an assignment decision.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A duration string could not be parsed or was non-positive
    #[error("Invalid duration '{text}': {reason}")]
    InvalidDuration { text: String, reason: String },

    /// A deadline was requested for a work item without a price label
    #[error("Work item carries no price label")]
    MissingPriceLabel,

    /// A contributor's role has no entry in the task-limit map. Fails
    /// closed; never defaults to unlimited.
    #[error("No task limit configured for role '{role}'")]
    UnknownRole { role: String },

    /// A platform read failed (after its fallback, where one exists)
    #[error("Platform read failed: {0}")]
    Tracker(#[from] TrackerError),

    /// A contributor's login did not resolve to a numeric identifier
    #[error("Could not resolve an account id for '{login}'")]
    IdentifierResolution { login: String },

    /// The commit-phase write (assignees or confirmation comment) failed.
    /// Never retried; nothing is assumed committed.
    #[error("Assignment write failed: {0}")]
    AssignmentWrite(#[source] TrackerError),
}
