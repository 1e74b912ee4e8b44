//! Task-limit accounting.
//!
//! A contributor's raw open-assignment count is adjusted by the review
//! state of their open, work-item-linked pull requests: approved PRs free
//! capacity, changes-requested PRs consume it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use tracker::{ItemState, Tracker};

use crate::error::EngineError;
use crate::review::{classify, filter_authoritative, ReviewOutcome};
use crate::settings::EngineSettings;

/// Result of evaluating one contributor against their task limit.
#[derive(Debug, Clone, Serialize)]
pub struct LimitCheck {
    /// Contributor login
    pub login: String,
    /// Role the limit was derived from
    pub role: String,
    /// Whether the contributor may take on another task
    pub eligible: bool,
    /// Raw assignment count adjusted by PR review state (may be negative)
    pub adjusted_count: i64,
    /// Role-derived limit
    pub limit: u32,
}

/// How one open pull request counts against the adjusted task total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrStanding {
    /// Frees capacity
    Approved,
    /// Consumes capacity
    ChangesRequested,
    /// Counts neither way
    Neutral,
}

/// Fold a review outcome into a standing, applying the benefit-of-the-doubt
/// rule: an unreviewed pull request older than the tolerance counts as
/// approved (it is not blocking the author).
fn standing(
    outcome: ReviewOutcome,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    tolerance_ms: i64,
) -> PrStanding {
    match outcome {
        ReviewOutcome::Approved => PrStanding::Approved,
        ReviewOutcome::ChangesRequested => PrStanding::ChangesRequested,
        ReviewOutcome::Unreviewed => {
            if (now - created_at).num_milliseconds() >= tolerance_ms {
                PrStanding::Approved
            } else {
                PrStanding::Neutral
            }
        }
    }
}

/// Evaluates contributors against their role-derived task limits.
pub struct TaskLimits<'a, T: Tracker> {
    tracker: &'a T,
    settings: &'a EngineSettings,
}

impl<'a, T: Tracker> TaskLimits<'a, T> {
    /// Create an evaluator over a tracker and settings.
    pub fn new(tracker: &'a T, settings: &'a EngineSettings) -> Self {
        Self { tracker, settings }
    }

    /// Evaluate one contributor. An unknown role fails closed.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn evaluate(&self, login: &str, now: DateTime<Utc>) -> Result<LimitCheck, EngineError> {
        let role = self.tracker.contributor_role(login).await?;
        let limit = self
            .settings
            .max_concurrent_tasks
            .get(&role)
            .copied()
            .ok_or_else(|| EngineError::UnknownRole { role: role.clone() })?;

        let assigned = self
            .tracker
            .open_assigned_work_items(login, self.settings.assigned_issue_scope)
            .await?;
        let pulls = self.tracker.open_pull_requests(login).await?;

        let mut approved: i64 = 0;
        let mut changes_requested: i64 = 0;
        for pr in pulls
            .iter()
            .filter(|p| p.state == ItemState::Open && p.links_work_item())
        {
            let pr_ref = pr.pr_ref();
            let reviews = self.tracker.reviews(&pr_ref).await?;
            let reviews = filter_authoritative(&reviews, &self.settings.review_authority_roles);
            // Timeline failures degrade to "no override", never fatal here.
            let requests = match self.tracker.review_request_timeline(&pr_ref).await {
                Ok(requests) => requests,
                Err(e) => {
                    warn!(
                        pr = %format!("{}#{}", pr.repo, pr.number),
                        error = %e,
                        "Review-request timeline unavailable, treating as empty"
                    );
                    Vec::new()
                }
            };

            let state = classify(&reviews, &requests);
            match standing(
                state.outcome,
                pr.created_at,
                now,
                self.settings.review_delay_tolerance_ms,
            ) {
                PrStanding::Approved => approved += 1,
                PrStanding::ChangesRequested => changes_requested += 1,
                PrStanding::Neutral => {}
            }
        }

        let adjusted_count = assigned.len() as i64 - approved + changes_requested;
        // The absolute value tolerates a negative adjustment without
        // granting unlimited extra capacity in the other direction.
        let eligible = adjusted_count.unsigned_abs() < u64::from(limit);

        Ok(LimitCheck {
            login: login.to_string(),
            role,
            eligible,
            adjusted_count,
            limit,
        })
    }
}
