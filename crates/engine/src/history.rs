//! Re-assignment-after-unassignment history checks.

use tracker::{AssignmentEvent, AssignmentEventKind};

/// Checks whether a contributor was previously removed from a work item
/// in a way that permanently bars re-assignment.
///
/// Constructed with the bot's own numeric platform identifier, injected
/// from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReassignmentHistory {
    bot_app_id: u64,
}

impl ReassignmentHistory {
    /// Create a checker for the given bot identity.
    #[must_use]
    pub fn new(bot_app_id: u64) -> Self {
        Self { bot_app_id }
    }

    /// Whether the contributor is barred from this work item.
    ///
    /// Barred iff some unassignment of this contributor was performed by
    /// the bot itself, or by an actor who is neither the contributor nor
    /// the bot. Self-unassignment never bars. One-way gate: no expiry,
    /// no override.
    #[must_use]
    pub fn barred(&self, login: &str, events: &[AssignmentEvent]) -> bool {
        events
            .iter()
            .filter(|e| e.kind == AssignmentEventKind::Unassigned && e.assignee == login)
            .any(|e| e.actor_id == self.bot_app_id || e.actor_login != login)
    }
}
