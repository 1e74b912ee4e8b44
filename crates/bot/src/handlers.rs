//! Command handlers bridging webhook events to the eligibility engine.

use serde_json::{json, Value};
use tracing::{error, info, warn};

use engine::{AssignmentEngine, AssignmentRequest, Decision};
use tracker::{GitHubApi, GitHubTracker, RepoRef, Tracker};

use crate::commands::{self, Command};
use crate::config::Config;
use crate::webhooks::IssueCommentEvent;

const UPSTREAM_FAILURE_TEXT: &str =
    "Something went wrong while processing this request. Nothing was assigned; please try again.";

fn ignored(reason: &str) -> Value {
    json!({ "status": "ignored", "reason": reason })
}

/// Process one `issue_comment` event end to end.
pub async fn process_event(config: &Config, api: &GitHubApi, event: IssueCommentEvent) -> Value {
    if event.action != "created" {
        return ignored("not_a_new_comment");
    }
    // The bot's own confirmations arrive back as webhook events.
    if event.comment.user.login.ends_with("[bot]") {
        return ignored("bot_comment");
    }
    let Some(command) = commands::parse(&event.comment.body) else {
        return ignored("no_command");
    };
    let Some(repo) = RepoRef::parse(&event.repository.full_name) else {
        warn!(repository = %event.repository.full_name, "Unparseable repository name");
        return json!({ "status": "error", "error": "unparseable repository name" });
    };

    info!(
        repo = %repo,
        item = event.issue.number,
        requester = %event.comment.user.login,
        command = ?command,
        "Processing command"
    );

    let tracker = GitHubTracker::new(api.clone(), repo)
        .with_network_orgs(config.network_orgs.clone())
        .with_wallets(config.wallet_registry.clone());

    match command {
        Command::Start { teammates } => start(config, tracker, &event, teammates).await,
        Command::Stop => stop(&tracker, &event).await,
    }
}

/// `/start`: run the assignment decision sequence and report the outcome.
async fn start(
    config: &Config,
    tracker: GitHubTracker,
    event: &IssueCommentEvent,
    teammates: Vec<String>,
) -> Value {
    let item = event.issue.number;
    let request = AssignmentRequest {
        item,
        requester: event.comment.user.login.clone(),
        teammates,
    };
    let engine = AssignmentEngine::new(tracker.clone(), config.engine_settings());

    match engine.assign(&request).await {
        Ok(Decision::Committed(receipt)) => {
            let logins: Vec<&str> = receipt.assignees.iter().map(|a| a.login.as_str()).collect();
            json!({
                "status": "committed",
                "item": item,
                "assignees": logins,
                "deadline": receipt.deadline,
                "stale": receipt.stale
            })
        }
        Ok(Decision::Rejected(reason)) => {
            info!(item, reason = ?reason, "Assignment rejected");
            if let Err(e) = tracker.post_comment(item, &reason.to_string()).await {
                warn!(item, error = %e, "Failed to post rejection comment");
            }
            json!({ "status": "rejected", "reason": reason.to_string() })
        }
        Err(e) => {
            error!(item, error = %e, "Assignment decision failed");
            let _ = tracker.post_comment(item, UPSTREAM_FAILURE_TEXT).await;
            json!({ "status": "error", "error": e.to_string() })
        }
    }
}

/// `/stop`: remove the requester from the assignee set, when present.
async fn stop(tracker: &GitHubTracker, event: &IssueCommentEvent) -> Value {
    let item = event.issue.number;
    let requester = &event.comment.user.login;

    let current = match tracker.work_item(item).await {
        Ok(current) => current,
        Err(e) => {
            error!(item, error = %e, "Could not fetch work item for /stop");
            return json!({ "status": "error", "error": e.to_string() });
        }
    };

    if !current
        .assignees
        .iter()
        .any(|a| a.eq_ignore_ascii_case(requester))
    {
        let text = "You are not assigned to this task.";
        if let Err(e) = tracker.post_comment(item, text).await {
            warn!(item, error = %e, "Failed to post /stop rejection comment");
        }
        return json!({ "status": "rejected", "reason": text });
    }

    let remaining: Vec<String> = current
        .assignees
        .iter()
        .filter(|a| !a.eq_ignore_ascii_case(requester))
        .cloned()
        .collect();
    if let Err(e) = tracker.set_assignees(item, &remaining).await {
        error!(item, error = %e, "Unassignment write failed");
        let _ = tracker.post_comment(item, UPSTREAM_FAILURE_TEXT).await;
        return json!({ "status": "error", "error": e.to_string() });
    }

    let text = format!("@{requester} has been unassigned.");
    if let Err(e) = tracker.post_comment(item, &text).await {
        warn!(item, error = %e, "Failed to post /stop confirmation");
    }
    info!(item, requester = %requester, "Contributor unassigned");
    json!({ "status": "committed", "item": item, "unassigned": requester })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::{EventAccount, EventComment, EventIssue, EventRepository};

    fn event(action: &str, login: &str, body: &str) -> IssueCommentEvent {
        IssueCommentEvent {
            action: action.to_string(),
            issue: EventIssue { number: 12 },
            comment: EventComment {
                body: body.to_string(),
                user: EventAccount {
                    login: login.to_string(),
                    id: 100,
                },
            },
            repository: EventRepository {
                full_name: "acme/widgets".to_string(),
            },
        }
    }

    fn idle_api() -> GitHubApi {
        // Never contacted on the ignored paths below.
        GitHubApi::with_base_url("token", "http://127.0.0.1:9").unwrap()
    }

    #[tokio::test]
    async fn test_edited_comments_are_ignored() {
        let value = process_event(&Config::default(), &idle_api(), event("edited", "alice", "/start")).await;
        assert_eq!(value["status"], "ignored");
        assert_eq!(value["reason"], "not_a_new_comment");
    }

    #[tokio::test]
    async fn test_bot_comments_are_ignored() {
        let value =
            process_event(&Config::default(), &idle_api(), event("created", "dibs-bot[bot]", "/start")).await;
        assert_eq!(value["reason"], "bot_comment");
    }

    #[tokio::test]
    async fn test_plain_comments_are_ignored() {
        let value =
            process_event(&Config::default(), &idle_api(), event("created", "alice", "nice work")).await;
        assert_eq!(value["reason"], "no_command");
    }
}
