//! Pull request review-state classification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracker::{Review, ReviewRequest, ReviewVerdict};

/// Classification outcome for one pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Most recent decisive review approved (or a re-request superseded a
    /// changes-requested review)
    Approved,
    /// Most recent decisive review requested changes, with no later
    /// re-request
    ChangesRequested,
    /// No decisive review exists
    Unreviewed,
}

/// Review state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewState {
    /// Classification outcome
    pub outcome: ReviewOutcome,
    /// Submission time of the decisive review, when one exists
    pub latest_review_at: Option<DateTime<Utc>>,
    /// Whether a changes-requested review was superseded by a later
    /// review request
    pub rerequested_after_changes: bool,
}

impl ReviewState {
    fn unreviewed() -> Self {
        Self {
            outcome: ReviewOutcome::Unreviewed,
            latest_review_at: None,
            rerequested_after_changes: false,
        }
    }
}

/// Keep only reviews whose author role carries review authority.
#[must_use]
pub fn filter_authoritative(reviews: &[Review], authority_roles: &HashSet<String>) -> Vec<Review> {
    reviews
        .iter()
        .filter(|r| authority_roles.contains(&r.author_role))
        .cloned()
        .collect()
}

/// Classify a pull request from its reviews and review-request timeline.
///
/// Two pure passes. Pass one: the most recent decisive review (approved or
/// changes-requested; comment-only and dismissed reviews are not outcomes)
/// gives a provisional state. Pass two: a review request timestamped
/// strictly after a changes-requested review folds the state over to
/// approved. That override is a tolerance policy (the author was
/// re-invited to review, implying resolution), not a review outcome.
#[must_use]
pub fn classify(reviews: &[Review], requests: &[ReviewRequest]) -> ReviewState {
    let decisive = reviews
        .iter()
        .filter(|r| {
            matches!(
                r.verdict,
                ReviewVerdict::Approved | ReviewVerdict::ChangesRequested
            )
        })
        .max_by_key(|r| r.submitted_at);

    let Some(latest) = decisive else {
        return ReviewState::unreviewed();
    };

    match latest.verdict {
        ReviewVerdict::Approved => ReviewState {
            outcome: ReviewOutcome::Approved,
            latest_review_at: Some(latest.submitted_at),
            rerequested_after_changes: false,
        },
        ReviewVerdict::ChangesRequested => {
            let rerequested = requests.iter().any(|q| q.created_at > latest.submitted_at);
            ReviewState {
                outcome: if rerequested {
                    ReviewOutcome::Approved
                } else {
                    ReviewOutcome::ChangesRequested
                },
                latest_review_at: Some(latest.submitted_at),
                rerequested_after_changes: rerequested,
            }
        }
        _ => unreachable!("filtered to decisive verdicts"),
    }
}
