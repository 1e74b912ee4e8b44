//! The assignment decision sequence.
//!
//! `Requested → Validated → LimitChecked → HistoryChecked → Committed`,
//! with an absorbing `Rejected` reachable from every stage. Each gate is
//! synchronous with respect to the sequence; the independent
//! per-contributor checks fan out and are aggregated before any gate
//! fires. Policy rejections are values, fatal failures are errors.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};
use tracker::{Contributor, ItemState, Tracker, WorkItem};

use crate::deadline::{compute_deadline, is_stale, price_label};
use crate::error::EngineError;
use crate::history::ReassignmentHistory;
use crate::limits::{LimitCheck, TaskLimits};
use crate::settings::EngineSettings;

/// Checklist-style child-task reference, e.g. `- [ ] #123`. A body
/// containing one marks a parent item, which is never directly workable.
static CHILD_TASK_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*-\s*\[[ xX]\]\s+#\d+").expect("valid child-task regex")
});

/// A request to assign the requester (and any named teammates) to a work
/// item.
#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    /// Work item number
    pub item: u64,
    /// Requesting contributor's login
    pub requester: String,
    /// Teammates named on the request
    pub teammates: Vec<String>,
}

/// Why an assignment request was rejected. The `Display` text is surfaced
/// to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The work item is a parent of child tasks
    ParentItem,
    /// The work item is closed
    ItemClosed,
    /// The requester is already assigned
    AlreadyAssignedToRequester,
    /// Someone else is already assigned
    AlreadyAssigned { assignees: Vec<String> },
    /// The item carries none of the labels required to start
    MissingRequiredLabel { required: Vec<String> },
    /// The requester has no registered payout address
    WalletRequired { text: String },
    /// The sole requester is at or over their task limit
    RequesterAtCapacity { adjusted_count: i64, limit: u32 },
    /// Every named contributor is at or over their task limit
    TeamAtCapacity,
    /// No price label, so no deadline can be computed
    MissingPriceLabel,
    /// A restricted label excludes at least one contributor
    RestrictedToCollaborators { label: String, blocked: Vec<String> },
    /// A contributor was previously removed by the bot or an administrator
    PreviouslyUnassigned { login: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentItem => {
                write!(f, "This looks like a parent task. Start one of its child tasks instead.")
            }
            Self::ItemClosed => write!(f, "This task is closed and cannot be started."),
            Self::AlreadyAssignedToRequester => {
                write!(f, "You are already assigned to this task.")
            }
            Self::AlreadyAssigned { assignees } => {
                write!(f, "This task is already assigned to {}.", logins(assignees))
            }
            Self::MissingRequiredLabel { required } => write!(
                f,
                "This task cannot be started until one of these labels is applied: {}.",
                required.join(", ")
            ),
            Self::WalletRequired { text } => write!(f, "{text}"),
            Self::RequesterAtCapacity {
                adjusted_count,
                limit,
            } => write!(
                f,
                "You have reached your concurrent task limit ({adjusted_count} of {limit})."
            ),
            Self::TeamAtCapacity => write!(
                f,
                "Everyone named on this request has reached their concurrent task limit."
            ),
            Self::MissingPriceLabel => {
                write!(f, "This task has no price label, so no deadline can be set.")
            }
            Self::RestrictedToCollaborators { label, blocked } => write!(
                f,
                "The label \"{label}\" restricts this task to collaborators; not eligible: {}.",
                logins(blocked)
            ),
            Self::PreviouslyUnassigned { login } => write!(
                f,
                "@{login} was previously unassigned from this task and cannot take it again."
            ),
        }
    }
}

fn logins(list: &[String]) -> String {
    list.iter()
        .map(|l| format!("@{l}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structured confirmation record for a committed assignment.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentReceipt {
    /// Work item number
    pub item: u64,
    /// Computed deadline
    pub deadline: DateTime<Utc>,
    /// Whether the work item is stale against the configured timeout
    pub stale: bool,
    /// The committed assignee set, identifiers resolved
    pub assignees: Vec<Contributor>,
}

impl AssignmentReceipt {
    /// Render the confirmation comment body.
    #[must_use]
    pub fn render(&self) -> String {
        let assignees = self
            .assignees
            .iter()
            .map(|a| format!("@{}", a.login))
            .collect::<Vec<_>>()
            .join(", ");
        let mut body = format!(
            "Task assigned to {assignees}.\n\nDeadline: {}\n",
            self.deadline.format("%a, %b %e, %Y %H:%M UTC")
        );
        if self.stale {
            body.push_str("\nNote: this task predates the staleness threshold; please confirm it is still relevant before starting work.\n");
        }
        body
    }
}

/// Outcome of an assignment decision.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The assignment was written and confirmed
    Committed(AssignmentReceipt),
    /// The request was rejected with a user-visible reason
    Rejected(RejectReason),
}

/// Composes the eligibility checks into the admit/deny decision sequence.
pub struct AssignmentEngine<T: Tracker> {
    tracker: T,
    settings: EngineSettings,
    history: ReassignmentHistory,
}

impl<T: Tracker> AssignmentEngine<T> {
    /// Create an engine over a repo-scoped tracker.
    pub fn new(tracker: T, settings: EngineSettings) -> Self {
        let history = ReassignmentHistory::new(settings.bot_app_id);
        Self {
            tracker,
            settings,
            history,
        }
    }

    /// Run the full decision sequence for one request.
    ///
    /// The "already assigned" precondition is checked against the state
    /// observed here; the commit write remains authoritative if remote
    /// state changes underneath us (no locking exists at this boundary).
    #[allow(clippy::too_many_lines)]
    pub async fn assign(&self, request: &AssignmentRequest) -> Result<Decision, EngineError> {
        let now = Utc::now();
        let item = self.tracker.work_item(request.item).await?;

        // Gates 1-3: validation against the observed item state.
        if let Some(reason) = self.validate_item(&item, &request.requester) {
            return Ok(Decision::Rejected(reason));
        }

        // Wallet gate, before any capacity accounting runs.
        if self.settings.start_requires_wallet
            && self
                .tracker
                .wallet_address(&request.requester)
                .await?
                .is_none()
        {
            return Ok(Decision::Rejected(RejectReason::WalletRequired {
                text: self.settings.empty_wallet_text.clone(),
            }));
        }

        // Gate 4: per-contributor limit checks, fanned out and aggregated
        // before any decision is made on them.
        let candidates = candidate_set(&request.requester, &request.teammates);
        let limits = TaskLimits::new(&self.tracker, &self.settings);
        let checks: Vec<LimitCheck> = try_join_all(
            candidates
                .iter()
                .map(|login| limits.evaluate(login, now)),
        )
        .await?;

        let (kept, dropped): (Vec<&LimitCheck>, Vec<&LimitCheck>) =
            checks.iter().partition(|c| c.eligible);
        for check in &dropped {
            debug!(
                login = %check.login,
                adjusted_count = check.adjusted_count,
                limit = check.limit,
                "Contributor over task limit, dropped from assignment set"
            );
        }

        // Gate 5: nobody left.
        if kept.is_empty() {
            let reason = if candidates.len() > 1 {
                RejectReason::TeamAtCapacity
            } else {
                let check = &checks[0];
                RejectReason::RequesterAtCapacity {
                    adjusted_count: check.adjusted_count,
                    limit: check.limit,
                }
            };
            return Ok(Decision::Rejected(reason));
        }
        let kept: Vec<LimitCheck> = kept.into_iter().cloned().collect();
        let logins: Vec<String> = kept.iter().map(|c| c.login.clone()).collect();

        // Gate 6: a deadline needs a price label.
        if price_label(&item.labels).is_none() {
            return Ok(Decision::Rejected(RejectReason::MissingPriceLabel));
        }

        // Gate 7: restricted labels admit collaborators only, with no
        // partial restricted assignment.
        if let Some(reason) = self.check_restrictions(&item, &logins).await? {
            return Ok(Decision::Rejected(reason));
        }

        // Gate 8: reassignment history. One timeline read; the bar itself
        // is a pure per-contributor predicate. Any bar rejects the whole
        // batch.
        let timeline = self.tracker.assignment_timeline(request.item).await?;
        if let Some(barred) = logins
            .iter()
            .find(|login| self.history.barred(login, &timeline))
        {
            return Ok(Decision::Rejected(RejectReason::PreviouslyUnassigned {
                login: barred.clone(),
            }));
        }

        // Gate 9: late identifier resolution; a miss is fatal.
        let ids = try_join_all(
            logins
                .iter()
                .map(|login| self.tracker.resolve_identifier(login)),
        )
        .await?;
        let mut assignees = Vec::with_capacity(kept.len());
        for (check, id) in kept.iter().zip(ids) {
            let id = id.ok_or_else(|| EngineError::IdentifierResolution {
                login: check.login.clone(),
            })?;
            assignees.push(Contributor {
                login: check.login.clone(),
                id: Some(id),
                role: check.role.clone(),
            });
        }

        // Commit: deadline, authoritative assignee write (never retried),
        // confirmation comment.
        let deadline = compute_deadline(&item.labels, item.created_at)?;
        let receipt = AssignmentReceipt {
            item: request.item,
            deadline,
            stale: is_stale(self.settings.task_stale_timeout_ms, item.created_at, now),
            assignees,
        };

        self.tracker
            .set_assignees(request.item, &logins)
            .await
            .map_err(EngineError::AssignmentWrite)?;
        self.tracker
            .post_comment(request.item, &receipt.render())
            .await
            .map_err(EngineError::AssignmentWrite)?;

        info!(
            item = request.item,
            assignees = %logins.join(","),
            deadline = %receipt.deadline,
            "Assignment committed"
        );
        Ok(Decision::Committed(receipt))
    }

    /// Gates 1-3 plus the required-labels allow-list.
    fn validate_item(&self, item: &WorkItem, requester: &str) -> Option<RejectReason> {
        if CHILD_TASK_REF.is_match(&item.body) {
            return Some(RejectReason::ParentItem);
        }
        if item.state != ItemState::Open {
            return Some(RejectReason::ItemClosed);
        }
        if !item.assignees.is_empty() {
            let reason = if item
                .assignees
                .iter()
                .any(|a| a.eq_ignore_ascii_case(requester))
            {
                RejectReason::AlreadyAssignedToRequester
            } else {
                RejectReason::AlreadyAssigned {
                    assignees: item.assignees.clone(),
                }
            };
            return Some(reason);
        }
        let required = &self.settings.required_labels_to_start;
        if !required.is_empty()
            && !item
                .labels
                .iter()
                .any(|l| required.iter().any(|r| r.eq_ignore_ascii_case(&l.name)))
        {
            return Some(RejectReason::MissingRequiredLabel {
                required: required.clone(),
            });
        }
        None
    }

    /// Gate 7: every contributor must be a collaborator when any label is
    /// restricted.
    async fn check_restrictions(
        &self,
        item: &WorkItem,
        logins: &[String],
    ) -> Result<Option<RejectReason>, EngineError> {
        let Some(restricted) = item.labels.iter().find(|l| l.is_restricted()) else {
            return Ok(None);
        };

        let verdicts = try_join_all(
            logins
                .iter()
                .map(|login| self.tracker.is_collaborator(login)),
        )
        .await?;
        let blocked: Vec<String> = logins
            .iter()
            .zip(verdicts)
            .filter(|(_, ok)| !ok)
            .map(|(login, _)| login.clone())
            .collect();

        if blocked.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RejectReason::RestrictedToCollaborators {
                label: restricted.name.clone(),
                blocked,
            }))
        }
    }
}

/// Deduplicated candidate set: the requester always included, first.
fn candidate_set(requester: &str, teammates: &[String]) -> Vec<String> {
    let mut candidates = vec![requester.to_string()];
    for teammate in teammates {
        if !candidates
            .iter()
            .any(|c| c.eq_ignore_ascii_case(teammate))
        {
            candidates.push(teammate.clone());
        }
    }
    candidates
}
