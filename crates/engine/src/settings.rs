//! Engine configuration.

use std::collections::{HashMap, HashSet};
use tracker::IssueScope;

/// Settings consumed by the eligibility engine. Built once at startup
/// from the service configuration and injected into the orchestrator.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How long an unreviewed open pull request is given before it counts
    /// as approved in the adjusted task count (milliseconds).
    pub review_delay_tolerance_ms: i64,
    /// Age at which an assignment is flagged stale (milliseconds; zero
    /// disables the flag).
    pub task_stale_timeout_ms: i64,
    /// Role → maximum concurrent task count. Roles absent from this map
    /// fail closed.
    pub max_concurrent_tasks: HashMap<String, u32>,
    /// Scope for counting open assigned work items.
    pub assigned_issue_scope: IssueScope,
    /// Reviewer roles whose reviews count toward classification.
    pub review_authority_roles: HashSet<String>,
    /// When non-empty, a work item must carry at least one of these labels
    /// to be startable.
    pub required_labels_to_start: Vec<String>,
    /// Whether a requester must have a registered payout address.
    pub start_requires_wallet: bool,
    /// Rejection text for requesters without a payout address.
    pub empty_wallet_text: String,
    /// Numeric platform identifier of the bot itself, used by the
    /// reassignment history check.
    pub bot_app_id: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            review_delay_tolerance_ms: 86_400_000,        // 1 day
            task_stale_timeout_ms: 4 * 7 * 86_400_000,    // 4 weeks
            max_concurrent_tasks: HashMap::from([
                ("admin".to_string(), 20),
                ("member".to_string(), 10),
                ("contributor".to_string(), 2),
            ]),
            assigned_issue_scope: IssueScope::Org,
            review_authority_roles: HashSet::from([
                "OWNER".to_string(),
                "MEMBER".to_string(),
                "COLLABORATOR".to_string(),
            ]),
            required_labels_to_start: Vec::new(),
            start_requires_wallet: false,
            empty_wallet_text: "Please register a wallet address before starting.".to_string(),
            bot_app_id: 0,
        }
    }
}
