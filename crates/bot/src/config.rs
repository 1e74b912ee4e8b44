//! Configuration for the dibs webhook service.

use std::collections::{HashMap, HashSet};
use std::env;
use tracing::warn;

use engine::duration::parse_duration_ms;
use engine::EngineSettings;
use tracker::IssueScope;

const DEFAULT_REVIEW_DELAY_TOLERANCE_MS: i64 = 86_400_000; // 1 day
const DEFAULT_TASK_STALE_TIMEOUT_MS: i64 = 4 * 7 * 86_400_000; // 4 weeks

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// GitHub token for API calls.
    pub github_token: String,
    /// Webhook signing secret for signature verification.
    pub webhook_secret: Option<String>,
    /// Numeric platform identifier of the bot's app account.
    pub bot_app_id: u64,
    /// How long an unreviewed PR is given before it counts as approved.
    pub review_delay_tolerance_ms: i64,
    /// Age at which an assignment is flagged stale (zero disables).
    pub task_stale_timeout_ms: i64,
    /// Role → maximum concurrent task count.
    pub max_concurrent_tasks: HashMap<String, u32>,
    /// Scope for counting open assigned work items.
    pub assigned_issue_scope: IssueScope,
    /// Reviewer roles whose reviews count toward classification.
    pub review_authority_roles: HashSet<String>,
    /// Labels a work item must carry (any of) to be startable.
    pub required_labels_to_start: Vec<String>,
    /// Whether a requester must have a registered payout address.
    pub start_requires_wallet: bool,
    /// Rejection text for requesters without a payout address.
    pub empty_wallet_text: String,
    /// Organizations included when the issue scope is `network`.
    pub network_orgs: Vec<String>,
    /// Registered payout addresses, keyed by login.
    pub wallet_registry: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            github_token: env::var("GITHUB_TOKEN").unwrap_or_default(),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            bot_app_id: env::var("BOT_APP_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            review_delay_tolerance_ms: duration_env(
                "REVIEW_DELAY_TOLERANCE",
                DEFAULT_REVIEW_DELAY_TOLERANCE_MS,
            ),
            task_stale_timeout_ms: duration_env(
                "TASK_STALE_TIMEOUT",
                DEFAULT_TASK_STALE_TIMEOUT_MS,
            ),
            max_concurrent_tasks: env::var("MAX_CONCURRENT_TASKS")
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_else(default_task_limits),
            assigned_issue_scope: env::var("ASSIGNED_ISSUE_SCOPE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(IssueScope::Org),
            review_authority_roles: list_env("REVIEW_AUTHORITY_ROLES")
                .map_or_else(default_authority_roles, |roles| {
                    roles.into_iter().collect()
                }),
            required_labels_to_start: list_env("REQUIRED_LABELS_TO_START").unwrap_or_default(),
            start_requires_wallet: env::var("START_REQUIRES_WALLET")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            empty_wallet_text: env::var("EMPTY_WALLET_TEXT").unwrap_or_else(|_| {
                "Please register a wallet address before starting.".to_string()
            }),
            network_orgs: list_env("NETWORK_ORGS").unwrap_or_default(),
            wallet_registry: env::var("WALLET_REGISTRY")
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
        }
    }
}

impl Config {
    /// Settings handed to the eligibility engine.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            review_delay_tolerance_ms: self.review_delay_tolerance_ms,
            task_stale_timeout_ms: self.task_stale_timeout_ms,
            max_concurrent_tasks: self.max_concurrent_tasks.clone(),
            assigned_issue_scope: self.assigned_issue_scope,
            review_authority_roles: self.review_authority_roles.clone(),
            required_labels_to_start: self.required_labels_to_start.clone(),
            start_requires_wallet: self.start_requires_wallet,
            empty_wallet_text: self.empty_wallet_text.clone(),
            bot_app_id: self.bot_app_id,
        }
    }
}

/// Parse a duration env var, falling back (with a warning) on bad input.
fn duration_env(key: &str, default_ms: i64) -> i64 {
    match env::var(key) {
        Ok(text) => match parse_duration_ms(&text) {
            Ok(ms) => ms,
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring unparseable duration");
                default_ms
            }
        },
        Err(_) => default_ms,
    }
}

/// Comma-separated list env var, `None` when unset.
fn list_env(key: &str) -> Option<Vec<String>> {
    env::var(key).ok().map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

fn default_task_limits() -> HashMap<String, u32> {
    HashMap::from([
        ("admin".to_string(), 20),
        ("member".to_string(), 10),
        ("contributor".to_string(), 2),
    ])
}

fn default_authority_roles() -> HashSet<String> {
    HashSet::from([
        "OWNER".to_string(),
        "MEMBER".to_string(),
        "COLLABORATOR".to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "PORT",
            "GITHUB_TOKEN",
            "WEBHOOK_SECRET",
            "BOT_APP_ID",
            "REVIEW_DELAY_TOLERANCE",
            "TASK_STALE_TIMEOUT",
            "MAX_CONCURRENT_TASKS",
            "ASSIGNED_ISSUE_SCOPE",
            "REVIEW_AUTHORITY_ROLES",
            "REQUIRED_LABELS_TO_START",
            "START_REQUIRES_WALLET",
            "EMPTY_WALLET_TEXT",
            "NETWORK_ORGS",
            "WALLET_REGISTRY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_config() {
        clear_env();

        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.bot_app_id, 0);
        assert_eq!(config.review_delay_tolerance_ms, 86_400_000);
        assert_eq!(config.max_concurrent_tasks.get("contributor"), Some(&2));
        assert_eq!(config.assigned_issue_scope, IssueScope::Org);
        assert!(!config.start_requires_wallet);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_env();
        env::set_var("PORT", "9000");
        env::set_var("BOT_APP_ID", "4242");
        env::set_var("REVIEW_DELAY_TOLERANCE", "2 days");
        env::set_var("MAX_CONCURRENT_TASKS", r#"{"member": 5}"#);
        env::set_var("ASSIGNED_ISSUE_SCOPE", "network");
        env::set_var("NETWORK_ORGS", "acme, acme-labs");
        env::set_var("WALLET_REGISTRY", r#"{"alice": "0xabc"}"#);

        let config = Config::default();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bot_app_id, 4242);
        assert_eq!(config.review_delay_tolerance_ms, 2 * 86_400_000);
        assert_eq!(config.max_concurrent_tasks.get("member"), Some(&5));
        assert_eq!(config.assigned_issue_scope, IssueScope::Network);
        assert_eq!(config.network_orgs, vec!["acme", "acme-labs"]);
        assert_eq!(
            config.wallet_registry.get("alice"),
            Some(&"0xabc".to_string())
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_bad_duration_falls_back_to_default() {
        clear_env();
        env::set_var("TASK_STALE_TIMEOUT", "whenever");

        let config = Config::default();
        assert_eq!(config.task_stale_timeout_ms, DEFAULT_TASK_STALE_TIMEOUT_MS);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_engine_settings_mirror_config() {
        clear_env();
        env::set_var("BOT_APP_ID", "7");
        env::set_var("START_REQUIRES_WALLET", "true");

        let settings = Config::default().engine_settings();
        assert_eq!(settings.bot_app_id, 7);
        assert!(settings.start_requires_wallet);

        clear_env();
    }
}
