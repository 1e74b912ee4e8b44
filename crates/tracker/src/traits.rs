//! The collaborator interface consumed by the eligibility engine.

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::models::{
    AssignmentEvent, IssueScope, PullRequestRef, PullRequestSummary, Review, ReviewRequest,
    WorkItem,
};

/// Platform queries and writes the engine needs, scoped to one repository.
///
/// Implementations are expected to be cheap to clone and safe to share
/// across the concurrent per-contributor checks.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Fetch a work item by number.
    async fn work_item(&self, number: u64) -> Result<WorkItem, TrackerError>;

    /// Replace the assignee set of a work item. Never retried.
    async fn set_assignees(&self, number: u64, logins: &[String]) -> Result<(), TrackerError>;

    /// Open work items currently assigned to a contributor within a scope.
    async fn open_assigned_work_items(
        &self,
        login: &str,
        scope: IssueScope,
    ) -> Result<Vec<WorkItem>, TrackerError>;

    /// Open pull requests authored by a contributor.
    async fn open_pull_requests(
        &self,
        login: &str,
    ) -> Result<Vec<PullRequestSummary>, TrackerError>;

    /// Submitted reviews for a pull request, oldest first.
    async fn reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, TrackerError>;

    /// Review-request entries from a pull request's timeline, oldest first.
    async fn review_request_timeline(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ReviewRequest>, TrackerError>;

    /// Assignment/unassignment history of a work item, oldest first.
    async fn assignment_timeline(
        &self,
        number: u64,
    ) -> Result<Vec<AssignmentEvent>, TrackerError>;

    /// Whether a login is a recognized collaborator of the repository.
    async fn is_collaborator(&self, login: &str) -> Result<bool, TrackerError>;

    /// Resolve a login to its numeric platform identifier, if any.
    async fn resolve_identifier(&self, login: &str) -> Result<Option<u64>, TrackerError>;

    /// Role of a contributor relative to the repository, as a task-limit
    /// lookup key (e.g. "admin", "member", "contributor").
    async fn contributor_role(&self, login: &str) -> Result<String, TrackerError>;

    /// Registered payout address for a login, if any.
    async fn wallet_address(&self, login: &str) -> Result<Option<String>, TrackerError>;

    /// Post a comment on a work item.
    async fn post_comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;
}
