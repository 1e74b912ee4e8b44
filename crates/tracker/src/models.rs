//! Record types for the platform boundary.
//!
//! Everything the eligibility engine reads from the hosting platform is
//! expressed as one of these types. The REST client converts raw payloads
//! into them at the boundary; nothing downstream branches on optional or
//! duck-typed fields.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Closing-keyword phrasing that links a pull request body to a work item,
/// e.g. "Resolves #123" or "fixes owner/repo#42".
static LINKED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+(?:[\w.-]+/[\w.-]+)?#\d+")
        .expect("valid linked-item regex")
});

/// Marker text in a label description that restricts assignment to
/// recognized collaborators.
const RESTRICTED_MARKER: &str = "collaborator only";

/// A repository reference (owner + name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Create a reference from owner and name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` string.
    #[must_use]
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Open/closed state of a work item or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Open and actionable
    Open,
    /// Closed
    Closed,
    /// Unknown state (catch-all to avoid parse failures)
    #[serde(other)]
    Unknown,
}

/// A label on a work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Label name (may encode a price, e.g. "Price: 3 Days")
    pub name: String,
    /// Optional descriptive text (may encode an access restriction)
    #[serde(default)]
    pub description: Option<String>,
}

impl Label {
    /// Whether this label restricts assignment to recognized collaborators.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(RESTRICTED_MARKER))
    }
}

/// A unit of trackable work (issue) in the hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Issue number within its repository
    pub number: u64,
    /// Current state
    pub state: ItemState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Logins of current assignees (possibly empty)
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Labels on the item
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Body text
    #[serde(default)]
    pub body: String,
}

/// A pull request reference (repository + number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Repository the pull request lives in
    pub repo: RepoRef,
    /// Pull request number
    pub number: u64,
}

/// Summary of an open pull request owned by a contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSummary {
    /// Pull request number
    pub number: u64,
    /// Author login
    pub author: String,
    /// Repository (and thereby originating organization)
    pub repo: RepoRef,
    /// Body text, used to detect linkage to a work item
    #[serde(default)]
    pub body: String,
    /// Current state
    pub state: ItemState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PullRequestSummary {
    /// Reference for fetching reviews and timeline entries.
    #[must_use]
    pub fn pr_ref(&self) -> PullRequestRef {
        PullRequestRef {
            repo: self.repo.clone(),
            number: self.number,
        }
    }

    /// Whether the body links a work item via closing-keyword phrasing.
    #[must_use]
    pub fn links_work_item(&self) -> bool {
        LINKED_ITEM.is_match(&self.body)
    }
}

/// Verdict recorded by a single pull request review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewVerdict {
    /// Reviewer approved the changes
    Approved,
    /// Reviewer requested changes
    ChangesRequested,
    /// Comment-only review, not an outcome
    Commented,
    /// Review was dismissed
    Dismissed,
    /// Unknown verdict (catch-all to avoid parse failures)
    #[serde(other)]
    Unknown,
}

/// A submitted pull request review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer login
    pub author: String,
    /// Reviewer's role relative to the repository (e.g. MEMBER)
    pub author_role: String,
    /// Recorded verdict
    pub verdict: ReviewVerdict,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

/// A review-request entry from a pull request's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Login of the requested reviewer, when recorded
    #[serde(default)]
    pub reviewer: Option<String>,
    /// When the request was made
    pub created_at: DateTime<Utc>,
}

/// Kind of an assignment timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentEventKind {
    /// A contributor was assigned
    Assigned,
    /// A contributor was unassigned
    Unassigned,
}

/// An entry in a work item's assignment history. Read-only; never mutated
/// by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEvent {
    /// Whether this entry assigned or unassigned
    pub kind: AssignmentEventKind,
    /// Numeric platform identifier of the acting account
    pub actor_id: u64,
    /// Login of the acting account
    pub actor_login: String,
    /// Login of the affected assignee
    pub assignee: String,
    /// When the event happened
    pub created_at: DateTime<Utc>,
}

/// A contributor under consideration for assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    /// Login identifier
    pub login: String,
    /// Numeric platform identifier, resolved late in the decision sequence
    #[serde(default)]
    pub id: Option<u64>,
    /// Derived role, used only to look up a task limit
    pub role: String,
}

/// Scope for counting a contributor's open assigned work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueScope {
    /// The work item's owning organization
    Org,
    /// The work item's repository only
    Repo,
    /// The configured organization network
    Network,
}

impl FromStr for IssueScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "org" => Ok(Self::Org),
            "repo" => Ok(Self::Repo),
            "network" => Ok(Self::Network),
            other => Err(format!("unknown issue scope: '{other}'")),
        }
    }
}
