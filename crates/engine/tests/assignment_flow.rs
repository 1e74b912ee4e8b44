//! End-to-end tests for the assignment decision sequence.
//!
//! These drive the orchestrator against an in-memory tracker so every
//! gate can be exercised without a live platform.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use engine::{
    AssignmentEngine, AssignmentRequest, Decision, EngineError, EngineSettings, RejectReason,
};
use tracker::{
    AssignmentEvent, AssignmentEventKind, IssueScope, ItemState, Label, PullRequestRef,
    PullRequestSummary, RepoRef, Review, ReviewRequest, ReviewVerdict, Tracker, TrackerError,
    WorkItem,
};

const BOT_ID: u64 = 4242;

// =============================================================================
// In-memory tracker
// =============================================================================

#[derive(Default)]
struct FakeState {
    item: Mutex<Option<WorkItem>>,
    roles: Mutex<HashMap<String, String>>,
    assigned_counts: Mutex<HashMap<String, usize>>,
    pulls: Mutex<HashMap<String, Vec<PullRequestSummary>>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    review_requests: Mutex<HashMap<u64, Vec<ReviewRequest>>>,
    timeline: Mutex<Vec<AssignmentEvent>>,
    collaborators: Mutex<HashSet<String>>,
    ids: Mutex<HashMap<String, u64>>,
    wallets: Mutex<HashMap<String, String>>,
    fail_review_timeline: Mutex<bool>,
    fail_assignment_timeline: Mutex<bool>,
    // Recorded effects
    calls: Mutex<Vec<&'static str>>,
    assignee_writes: Mutex<Vec<Vec<String>>>,
    comments: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
struct FakeTracker {
    state: Arc<FakeState>,
}

impl FakeTracker {
    fn with_item(self, item: WorkItem) -> Self {
        *self.state.item.lock().unwrap() = Some(item);
        self
    }

    fn with_contributor(self, login: &str, role: &str, id: u64) -> Self {
        self.state
            .roles
            .lock()
            .unwrap()
            .insert(login.to_string(), role.to_string());
        self.state.ids.lock().unwrap().insert(login.to_string(), id);
        self
    }

    fn with_assigned_count(self, login: &str, count: usize) -> Self {
        self.state
            .assigned_counts
            .lock()
            .unwrap()
            .insert(login.to_string(), count);
        self
    }

    fn with_pull(
        self,
        login: &str,
        number: u64,
        created_at: DateTime<Utc>,
        reviews: Vec<Review>,
        requests: Vec<ReviewRequest>,
    ) -> Self {
        let pull = PullRequestSummary {
            number,
            author: login.to_string(),
            repo: RepoRef::new("acme", "widgets"),
            body: format!("Resolves #{number}"),
            state: ItemState::Open,
            created_at,
        };
        self.state
            .pulls
            .lock()
            .unwrap()
            .entry(login.to_string())
            .or_default()
            .push(pull);
        self.state.reviews.lock().unwrap().insert(number, reviews);
        self.state
            .review_requests
            .lock()
            .unwrap()
            .insert(number, requests);
        self
    }

    fn with_collaborator(self, login: &str) -> Self {
        self.state
            .collaborators
            .lock()
            .unwrap()
            .insert(login.to_string());
        self
    }

    fn with_wallet(self, login: &str, address: &str) -> Self {
        self.state
            .wallets
            .lock()
            .unwrap()
            .insert(login.to_string(), address.to_string());
        self
    }

    fn with_timeline(self, events: Vec<AssignmentEvent>) -> Self {
        *self.state.timeline.lock().unwrap() = events;
        self
    }

    fn failing_review_timeline(self) -> Self {
        *self.state.fail_review_timeline.lock().unwrap() = true;
        self
    }

    fn failing_assignment_timeline(self) -> Self {
        *self.state.fail_assignment_timeline.lock().unwrap() = true;
        self
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.calls.lock().unwrap().clone()
    }

    fn assignee_writes(&self) -> Vec<Vec<String>> {
        self.state.assignee_writes.lock().unwrap().clone()
    }

    fn comments(&self) -> Vec<String> {
        self.state.comments.lock().unwrap().clone()
    }

    fn note(&self, call: &'static str) {
        self.state.calls.lock().unwrap().push(call);
    }
}

fn upstream(status: u16) -> TrackerError {
    TrackerError::Api {
        status,
        message: "synthetic failure".to_string(),
    }
}

#[async_trait]
impl Tracker for FakeTracker {
    async fn work_item(&self, _number: u64) -> Result<WorkItem, TrackerError> {
        self.note("work_item");
        Ok(self
            .state
            .item
            .lock()
            .unwrap()
            .clone()
            .expect("test forgot to seed a work item"))
    }

    async fn set_assignees(&self, _number: u64, logins: &[String]) -> Result<(), TrackerError> {
        self.note("set_assignees");
        self.state
            .assignee_writes
            .lock()
            .unwrap()
            .push(logins.to_vec());
        Ok(())
    }

    async fn open_assigned_work_items(
        &self,
        login: &str,
        _scope: IssueScope,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        self.note("open_assigned_work_items");
        let count = self
            .state
            .assigned_counts
            .lock()
            .unwrap()
            .get(login)
            .copied()
            .unwrap_or(0);
        Ok((0..count).map(|i| open_item(900 + i as u64, vec![], "")).collect())
    }

    async fn open_pull_requests(
        &self,
        login: &str,
    ) -> Result<Vec<PullRequestSummary>, TrackerError> {
        self.note("open_pull_requests");
        Ok(self
            .state
            .pulls
            .lock()
            .unwrap()
            .get(login)
            .cloned()
            .unwrap_or_default())
    }

    async fn reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, TrackerError> {
        self.note("reviews");
        Ok(self
            .state
            .reviews
            .lock()
            .unwrap()
            .get(&pr.number)
            .cloned()
            .unwrap_or_default())
    }

    async fn review_request_timeline(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ReviewRequest>, TrackerError> {
        self.note("review_request_timeline");
        if *self.state.fail_review_timeline.lock().unwrap() {
            return Err(upstream(500));
        }
        Ok(self
            .state
            .review_requests
            .lock()
            .unwrap()
            .get(&pr.number)
            .cloned()
            .unwrap_or_default())
    }

    async fn assignment_timeline(
        &self,
        _number: u64,
    ) -> Result<Vec<AssignmentEvent>, TrackerError> {
        self.note("assignment_timeline");
        if *self.state.fail_assignment_timeline.lock().unwrap() {
            return Err(upstream(502));
        }
        Ok(self.state.timeline.lock().unwrap().clone())
    }

    async fn is_collaborator(&self, login: &str) -> Result<bool, TrackerError> {
        self.note("is_collaborator");
        Ok(self.state.collaborators.lock().unwrap().contains(login))
    }

    async fn resolve_identifier(&self, login: &str) -> Result<Option<u64>, TrackerError> {
        self.note("resolve_identifier");
        Ok(self.state.ids.lock().unwrap().get(login).copied())
    }

    async fn contributor_role(&self, login: &str) -> Result<String, TrackerError> {
        self.note("contributor_role");
        Ok(self
            .state
            .roles
            .lock()
            .unwrap()
            .get(login)
            .cloned()
            .unwrap_or_else(|| "contributor".to_string()))
    }

    async fn wallet_address(&self, login: &str) -> Result<Option<String>, TrackerError> {
        self.note("wallet_address");
        Ok(self.state.wallets.lock().unwrap().get(login).cloned())
    }

    async fn post_comment(&self, _number: u64, body: &str) -> Result<(), TrackerError> {
        self.note("post_comment");
        self.state.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()
}

fn label(name: &str) -> Label {
    Label {
        name: name.to_string(),
        description: None,
    }
}

fn restricted_label(name: &str) -> Label {
    Label {
        name: name.to_string(),
        description: Some("Collaborator only".to_string()),
    }
}

fn open_item(number: u64, labels: Vec<Label>, body: &str) -> WorkItem {
    WorkItem {
        number,
        state: ItemState::Open,
        created_at: created_at(),
        assignees: vec![],
        labels,
        body: body.to_string(),
    }
}

fn priced_item() -> WorkItem {
    open_item(12, vec![label("Price: 3 Days")], "Do the thing")
}

fn review(verdict: ReviewVerdict, at: DateTime<Utc>) -> Review {
    Review {
        author: "rev".to_string(),
        author_role: "MEMBER".to_string(),
        verdict,
        submitted_at: at,
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        bot_app_id: BOT_ID,
        // Fixtures carry fixed timestamps; staleness gets its own test.
        task_stale_timeout_ms: 0,
        ..EngineSettings::default()
    }
}

fn request(requester: &str, teammates: &[&str]) -> AssignmentRequest {
    AssignmentRequest {
        item: 12,
        requester: requester.to_string(),
        teammates: teammates.iter().map(|t| (*t).to_string()).collect(),
    }
}

fn engine_with(tracker: FakeTracker) -> AssignmentEngine<FakeTracker> {
    AssignmentEngine::new(tracker, settings())
}

fn rejected(decision: Decision) -> RejectReason {
    match decision {
        Decision::Rejected(reason) => reason,
        Decision::Committed(receipt) => panic!("expected rejection, got commit: {receipt:?}"),
    }
}

// =============================================================================
// Validation gates
// =============================================================================

#[tokio::test]
async fn test_happy_path_commits_with_deadline() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100);
    let engine = engine_with(tracker.clone());

    let decision = engine.assign(&request("alice", &[])).await.unwrap();
    let Decision::Committed(receipt) = decision else {
        panic!("expected commit, got {decision:?}");
    };

    assert_eq!(receipt.deadline, created_at() + Duration::days(3));
    assert_eq!(receipt.assignees.len(), 1);
    assert_eq!(receipt.assignees[0].login, "alice");
    assert_eq!(receipt.assignees[0].id, Some(100));
    assert_eq!(receipt.assignees[0].role, "contributor");
    assert!(!receipt.stale);

    assert_eq!(tracker.assignee_writes(), vec![vec!["alice".to_string()]]);
    let comments = tracker.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("@alice"));
}

#[tokio::test]
async fn test_parent_item_rejects_before_further_reads() {
    let tracker = FakeTracker::default().with_item(open_item(
        12,
        vec![label("Price: 1 Day")],
        "Tracking:\n- [ ] #101\n- [x] #102",
    ));
    let engine = engine_with(tracker.clone());

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(reason, RejectReason::ParentItem);
    // Only the initial fetch happened; no further remote state was read.
    assert_eq!(tracker.calls(), vec!["work_item"]);
}

#[tokio::test]
async fn test_closed_item_rejects() {
    let mut item = priced_item();
    item.state = ItemState::Closed;
    let engine = engine_with(FakeTracker::default().with_item(item));

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(reason, RejectReason::ItemClosed);
}

#[tokio::test]
async fn test_existing_assignee_rejects_with_distinct_reasons() {
    let mut item = priced_item();
    item.assignees = vec!["alice".to_string()];
    let engine = engine_with(FakeTracker::default().with_item(item.clone()));
    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(reason, RejectReason::AlreadyAssignedToRequester);

    let engine = engine_with(FakeTracker::default().with_item(item));
    let reason = rejected(engine.assign(&request("bob", &[])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::AlreadyAssigned {
            assignees: vec!["alice".to_string()]
        }
    );
}

#[tokio::test]
async fn test_missing_price_label_rejects_before_any_write() {
    let tracker = FakeTracker::default()
        .with_item(open_item(12, vec![label("bug")], ""))
        .with_contributor("alice", "contributor", 100);
    let engine = engine_with(tracker.clone());

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(reason, RejectReason::MissingPriceLabel);
    assert!(tracker.assignee_writes().is_empty());
    assert!(tracker.comments().is_empty());
}

#[tokio::test]
async fn test_required_labels_gate() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100);
    let mut settings = settings();
    settings.required_labels_to_start = vec!["ready".to_string()];
    let engine = AssignmentEngine::new(tracker, settings);

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert!(matches!(reason, RejectReason::MissingRequiredLabel { .. }));
}

// =============================================================================
// Capacity gates
// =============================================================================

#[tokio::test]
async fn test_limit_boundary_is_strict() {
    // contributor limit is 2: at exactly 2 the requester is ineligible.
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 2);
    let engine = engine_with(tracker);
    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::RequesterAtCapacity {
            adjusted_count: 2,
            limit: 2
        }
    );

    // At limit - 1 the requester is eligible.
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 1);
    let engine = engine_with(tracker);
    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_over_limit_teammate_is_dropped_not_fatal() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_contributor("bob", "contributor", 200)
        .with_assigned_count("bob", 2);
    let engine = engine_with(tracker.clone());

    let decision = engine.assign(&request("alice", &["bob"])).await.unwrap();
    let Decision::Committed(receipt) = decision else {
        panic!("expected commit, got {decision:?}");
    };
    let logins: Vec<&str> = receipt.assignees.iter().map(|a| a.login.as_str()).collect();
    assert_eq!(logins, vec!["alice"]);
}

#[tokio::test]
async fn test_over_limit_requester_dropped_but_teammates_proceed() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_contributor("bob", "contributor", 200)
        .with_assigned_count("alice", 2);
    let engine = engine_with(tracker);

    let decision = engine.assign(&request("alice", &["bob"])).await.unwrap();
    let Decision::Committed(receipt) = decision else {
        panic!("expected commit, got {decision:?}");
    };
    let logins: Vec<&str> = receipt.assignees.iter().map(|a| a.login.as_str()).collect();
    assert_eq!(logins, vec!["bob"]);
}

#[tokio::test]
async fn test_empty_set_messaging_distinguishes_solo_from_team() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_contributor("bob", "contributor", 200)
        .with_assigned_count("alice", 2)
        .with_assigned_count("bob", 3);
    let engine = engine_with(tracker);
    let reason = rejected(engine.assign(&request("alice", &["bob"])).await.unwrap());
    assert_eq!(reason, RejectReason::TeamAtCapacity);
}

#[tokio::test]
async fn test_unknown_role_fails_closed() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "wizard", 100);
    let engine = engine_with(tracker);

    let err = engine.assign(&request("alice", &[])).await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownRole { .. }));
}

// =============================================================================
// Review-state adjustments
// =============================================================================

#[tokio::test]
async fn test_approved_pull_request_frees_capacity() {
    // Two raw assignments put alice at her limit, but an approved open PR
    // adjusts the count back under it.
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 2)
        .with_pull(
            "alice",
            70,
            created_at(),
            vec![review(ReviewVerdict::Approved, created_at() + Duration::hours(4))],
            vec![],
        );
    let engine = engine_with(tracker);
    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_changes_requested_pull_request_consumes_capacity() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 1)
        .with_pull(
            "alice",
            70,
            created_at(),
            vec![review(
                ReviewVerdict::ChangesRequested,
                created_at() + Duration::hours(4),
            )],
            vec![],
        );
    let engine = engine_with(tracker);
    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::RequesterAtCapacity {
            adjusted_count: 2,
            limit: 2
        }
    );
}

#[tokio::test]
async fn test_rerequest_after_changes_counts_as_approved() {
    let reviewed_at = created_at() + Duration::hours(4);
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 2)
        .with_pull(
            "alice",
            70,
            created_at(),
            vec![review(ReviewVerdict::ChangesRequested, reviewed_at)],
            vec![ReviewRequest {
                reviewer: Some("rev".to_string()),
                created_at: reviewed_at + Duration::hours(1),
            }],
        );
    let engine = engine_with(tracker);
    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_old_unreviewed_pull_request_gets_benefit_of_the_doubt() {
    // The PR is far older than the review delay tolerance and has no
    // reviews at all: it counts as approved.
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 2)
        .with_pull("alice", 70, Utc::now() - Duration::days(30), vec![], vec![]);
    let engine = engine_with(tracker);
    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_review_timeline_failure_degrades_to_no_override() {
    // Changes-requested with a broken timeline source: the override is
    // simply unavailable, the decision itself is not fatal.
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_assigned_count("alice", 1)
        .with_pull(
            "alice",
            70,
            created_at(),
            vec![review(
                ReviewVerdict::ChangesRequested,
                created_at() + Duration::hours(4),
            )],
            vec![],
        )
        .failing_review_timeline();
    let engine = engine_with(tracker);
    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert!(matches!(reason, RejectReason::RequesterAtCapacity { .. }));
}

// =============================================================================
// Restricted labels, history, and identity
// =============================================================================

#[tokio::test]
async fn test_restricted_label_rejects_non_collaborators_wholesale() {
    let tracker = FakeTracker::default()
        .with_item(open_item(
            12,
            vec![label("Price: 1 Day"), restricted_label("Priority: 1")],
            "",
        ))
        .with_contributor("alice", "contributor", 100)
        .with_contributor("bob", "contributor", 200)
        .with_collaborator("alice");
    let engine = engine_with(tracker.clone());

    let reason = rejected(engine.assign(&request("alice", &["bob"])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::RestrictedToCollaborators {
            label: "Priority: 1".to_string(),
            blocked: vec!["bob".to_string()]
        }
    );
    assert!(tracker.assignee_writes().is_empty());
}

fn unassignment(actor_id: u64, actor: &str, assignee: &str) -> AssignmentEvent {
    AssignmentEvent {
        kind: AssignmentEventKind::Unassigned,
        actor_id,
        actor_login: actor.to_string(),
        assignee: assignee.to_string(),
        created_at: created_at() - Duration::days(7),
    }
}

#[tokio::test]
async fn test_bot_unassignment_bars_reassignment() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_timeline(vec![unassignment(BOT_ID, "dibs-bot[bot]", "alice")]);
    let engine = engine_with(tracker);

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::PreviouslyUnassigned {
            login: "alice".to_string()
        }
    );
}

#[tokio::test]
async fn test_self_unassignment_does_not_bar() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_timeline(vec![unassignment(100, "alice", "alice")]);
    let engine = engine_with(tracker);

    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_one_barred_teammate_rejects_the_whole_batch() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_contributor("bob", "contributor", 200)
        .with_timeline(vec![unassignment(7, "boss", "bob")]);
    let engine = engine_with(tracker.clone());

    let reason = rejected(engine.assign(&request("alice", &["bob"])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::PreviouslyUnassigned {
            login: "bob".to_string()
        }
    );
    assert!(tracker.assignee_writes().is_empty());
}

#[tokio::test]
async fn test_assignment_timeline_failure_is_fatal() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .failing_assignment_timeline();
    let engine = engine_with(tracker);

    let err = engine.assign(&request("alice", &[])).await.unwrap_err();
    assert!(matches!(err, EngineError::Tracker(_)));
}

#[tokio::test]
async fn test_unresolvable_identifier_is_fatal() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100);
    // "ghost" has a role (default) but no id entry.
    let engine = engine_with(tracker);

    let err = engine.assign(&request("alice", &["ghost"])).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::IdentifierResolution { ref login } if login == "ghost"
    ));
}

// =============================================================================
// Wallet gate and staleness
// =============================================================================

#[tokio::test]
async fn test_wallet_gate_rejects_before_capacity_accounting() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100);
    let mut settings = settings();
    settings.start_requires_wallet = true;
    settings.empty_wallet_text = "Register a wallet first.".to_string();
    let engine = AssignmentEngine::new(tracker.clone(), settings);

    let reason = rejected(engine.assign(&request("alice", &[])).await.unwrap());
    assert_eq!(
        reason,
        RejectReason::WalletRequired {
            text: "Register a wallet first.".to_string()
        }
    );
    assert!(!tracker.calls().contains(&"open_assigned_work_items"));
}

#[tokio::test]
async fn test_wallet_gate_passes_with_registered_address() {
    let tracker = FakeTracker::default()
        .with_item(priced_item())
        .with_contributor("alice", "contributor", 100)
        .with_wallet("alice", "0xabc");
    let mut settings = settings();
    settings.start_requires_wallet = true;
    let engine = AssignmentEngine::new(tracker, settings);

    assert!(matches!(
        engine.assign(&request("alice", &[])).await.unwrap(),
        Decision::Committed(_)
    ));
}

#[tokio::test]
async fn test_old_item_is_flagged_stale_in_receipt() {
    let mut item = priced_item();
    item.created_at = Utc::now() - Duration::weeks(10);
    let tracker = FakeTracker::default()
        .with_item(item)
        .with_contributor("alice", "contributor", 100);
    let mut settings = settings();
    settings.task_stale_timeout_ms = 4 * 7 * 86_400_000; // 4 weeks
    let engine = AssignmentEngine::new(tracker.clone(), settings);

    let decision = engine.assign(&request("alice", &[])).await.unwrap();
    let Decision::Committed(receipt) = decision else {
        panic!("expected commit, got {decision:?}");
    };
    assert!(receipt.stale);
    assert!(tracker.comments()[0].contains("staleness threshold"));
}
