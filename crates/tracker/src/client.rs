//! GitHub REST implementation of the collaborator interface.
//!
//! Raw API payloads are parsed into private wire structs and converted to
//! the record types in [`crate::models`] at this boundary. The
//! assigned-items and open-pull-request listings have a documented
//! alternate query method and go through the [`ReadFallback`] policy;
//! everything else is a single read, and writes are never retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

use crate::error::TrackerError;
use crate::models::{
    AssignmentEvent, AssignmentEventKind, IssueScope, ItemState, Label, PullRequestRef,
    PullRequestSummary, RepoRef, Review, ReviewRequest, ReviewVerdict, WorkItem,
};
use crate::retry::ReadFallback;
use crate::traits::Tracker;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Shared GitHub API transport: one HTTP client, one token.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubApi {
    /// Create a transport against the public GitHub API.
    pub fn new(token: &str) -> Result<Self, TrackerError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Create a transport against a custom base URL (tests, GHE).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("dibs-bot/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, TrackerError> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    /// GET a path and decode the JSON response, surfacing non-success
    /// statuses as [`TrackerError::Api`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &'static str,
    ) -> Result<T, TrackerError> {
        let response = self.send(reqwest::Method::GET, path, None).await?;
        Self::decode(response, what).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &'static str,
    ) -> Result<T, TrackerError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response.json().await.map_err(|e| TrackerError::Decode {
            what,
            reason: e.to_string(),
        })
    }

    async fn expect_success(
        response: reqwest::Response,
    ) -> Result<(), TrackerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(TrackerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

// =============================================================================
// Wire structs
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawAccount {
    login: String,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    state: ItemState,
    created_at: DateTime<Utc>,
    #[serde(default)]
    assignees: Vec<RawAccount>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    body: Option<String>,
    /// Present when a search item is actually a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
    #[serde(default)]
    repository_url: Option<String>,
    #[serde(default)]
    user: Option<RawAccount>,
}

impl RawIssue {
    fn into_work_item(self) -> WorkItem {
        WorkItem {
            number: self.number,
            state: self.state,
            created_at: self.created_at,
            assignees: self.assignees.into_iter().map(|a| a.login).collect(),
            labels: self
                .labels
                .into_iter()
                .map(|l| Label {
                    name: l.name,
                    description: l.description,
                })
                .collect(),
            body: self.body.unwrap_or_default(),
        }
    }

    /// Repository parsed from `repository_url`, e.g.
    /// `https://api.github.com/repos/acme/widgets`.
    fn repo_ref(&self) -> Option<RepoRef> {
        let url = self.repository_url.as_deref()?;
        let tail = url.split("/repos/").nth(1)?;
        RepoRef::parse(tail)
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchResults {
    items: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawPull {
    number: u64,
    user: RawAccount,
    #[serde(default)]
    body: Option<String>,
    state: ItemState,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    user: RawAccount,
    #[serde(default)]
    author_association: Option<String>,
    state: ReviewVerdict,
    /// Absent on pending (unsubmitted) reviews.
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawTimelineEvent {
    event: String,
    #[serde(default)]
    actor: Option<RawAccount>,
    #[serde(default)]
    assignee: Option<RawAccount>,
    #[serde(default)]
    requested_reviewer: Option<RawAccount>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawPermission {
    permission: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: u64,
}

/// Map a repository permission level onto a task-limit role key.
fn role_for_permission(permission: &str) -> String {
    match permission {
        "admin" => "admin".to_string(),
        "write" | "maintain" => "member".to_string(),
        _ => "contributor".to_string(),
    }
}

// =============================================================================
// Tracker implementation
// =============================================================================

/// GitHub-backed [`Tracker`], scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubTracker {
    api: GitHubApi,
    repo: RepoRef,
    network_orgs: Vec<String>,
    wallets: HashMap<String, String>,
}

impl GitHubTracker {
    /// Create a tracker scoped to a repository.
    #[must_use]
    pub fn new(api: GitHubApi, repo: RepoRef) -> Self {
        Self {
            api,
            repo,
            network_orgs: Vec::new(),
            wallets: HashMap::new(),
        }
    }

    /// Organizations included when the issue scope is `network`.
    #[must_use]
    pub fn with_network_orgs(mut self, orgs: Vec<String>) -> Self {
        self.network_orgs = orgs;
        self
    }

    /// Registered payout addresses, keyed by login.
    #[must_use]
    pub fn with_wallets(mut self, wallets: HashMap<String, String>) -> Self {
        self.wallets = wallets;
        self
    }

    /// Search-qualifier fragment for an issue scope.
    fn scope_qualifier(&self, scope: IssueScope) -> String {
        match scope {
            IssueScope::Repo => format!("repo:{}", self.repo),
            IssueScope::Org => format!("org:{}", self.repo.owner),
            IssueScope::Network => {
                if self.network_orgs.is_empty() {
                    format!("org:{}", self.repo.owner)
                } else {
                    self.network_orgs
                        .iter()
                        .map(|o| format!("org:{o}"))
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            }
        }
    }

    async fn search_issues(&self, query: &str) -> Result<Vec<RawIssue>, TrackerError> {
        let path = format!(
            "search/issues?q={}&per_page=100",
            urlencoding::encode(query)
        );
        let results: RawSearchResults = self.api.get_json(&path, "search results").await?;
        Ok(results.items)
    }

    /// Fallback listing for assigned work items: the origin repository's
    /// own issue index, filtered server-side by assignee.
    async fn list_assigned_in_repo(&self, login: &str) -> Result<Vec<WorkItem>, TrackerError> {
        let path = format!(
            "repos/{}/issues?assignee={}&state=open&per_page=100",
            self.repo,
            urlencoding::encode(login)
        );
        let raw: Vec<RawIssue> = self.api.get_json(&path, "issue list").await?;
        Ok(raw
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(RawIssue::into_work_item)
            .collect())
    }

    async fn search_assigned(
        &self,
        login: &str,
        scope: IssueScope,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        let query = format!(
            "is:issue is:open assignee:{login} {}",
            self.scope_qualifier(scope)
        );
        let items = self.search_issues(&query).await?;
        Ok(items
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(RawIssue::into_work_item)
            .collect())
    }

    async fn search_open_pulls(
        &self,
        login: &str,
    ) -> Result<Vec<PullRequestSummary>, TrackerError> {
        let query = format!("is:pr is:open author:{login} org:{}", self.repo.owner);
        let items = self.search_issues(&query).await?;
        Ok(items
            .into_iter()
            .filter_map(|raw| {
                let repo = raw.repo_ref()?;
                Some(PullRequestSummary {
                    number: raw.number,
                    author: raw.user.as_ref().map(|u| u.login.clone())?,
                    repo,
                    body: raw.body.unwrap_or_default(),
                    state: raw.state,
                    created_at: raw.created_at,
                })
            })
            .collect())
    }

    /// Fallback listing for open pull requests: the origin repository's
    /// pull index, filtered here by author.
    async fn list_open_pulls_in_repo(
        &self,
        login: &str,
    ) -> Result<Vec<PullRequestSummary>, TrackerError> {
        let path = format!("repos/{}/pulls?state=open&per_page=100", self.repo);
        let raw: Vec<RawPull> = self.api.get_json(&path, "pull list").await?;
        Ok(raw
            .into_iter()
            .filter(|p| p.user.login.eq_ignore_ascii_case(login))
            .map(|p| PullRequestSummary {
                number: p.number,
                author: p.user.login,
                repo: self.repo.clone(),
                body: p.body.unwrap_or_default(),
                state: p.state,
                created_at: p.created_at,
            })
            .collect())
    }

    async fn timeline(&self, number: u64) -> Result<Vec<RawTimelineEvent>, TrackerError> {
        let path = format!("repos/{}/issues/{number}/timeline?per_page=100", self.repo);
        self.api.get_json(&path, "timeline").await
    }
}

#[async_trait]
impl Tracker for GitHubTracker {
    async fn work_item(&self, number: u64) -> Result<WorkItem, TrackerError> {
        let path = format!("repos/{}/issues/{number}", self.repo);
        let raw: RawIssue = self.api.get_json(&path, "work item").await?;
        Ok(raw.into_work_item())
    }

    async fn set_assignees(&self, number: u64, logins: &[String]) -> Result<(), TrackerError> {
        let current = self.work_item(number).await?;
        let to_remove: Vec<&String> = current
            .assignees
            .iter()
            .filter(|a| !logins.contains(*a))
            .collect();
        let to_add: Vec<&String> = logins
            .iter()
            .filter(|l| !current.assignees.contains(*l))
            .collect();

        let path = format!("repos/{}/issues/{number}/assignees", self.repo);
        if !to_remove.is_empty() {
            let response = self
                .api
                .send(
                    reqwest::Method::DELETE,
                    &path,
                    Some(json!({ "assignees": to_remove })),
                )
                .await?;
            GitHubApi::expect_success(response).await?;
        }
        if !to_add.is_empty() {
            let response = self
                .api
                .send(
                    reqwest::Method::POST,
                    &path,
                    Some(json!({ "assignees": to_add })),
                )
                .await?;
            GitHubApi::expect_success(response).await?;
        }
        Ok(())
    }

    async fn open_assigned_work_items(
        &self,
        login: &str,
        scope: IssueScope,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        ReadFallback::new("open_assigned_work_items")
            .run(
                self.search_assigned(login, scope),
                self.list_assigned_in_repo(login),
            )
            .await
    }

    async fn open_pull_requests(
        &self,
        login: &str,
    ) -> Result<Vec<PullRequestSummary>, TrackerError> {
        ReadFallback::new("open_pull_requests")
            .run(
                self.search_open_pulls(login),
                self.list_open_pulls_in_repo(login),
            )
            .await
    }

    async fn reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, TrackerError> {
        let path = format!("repos/{}/pulls/{}/reviews?per_page=100", pr.repo, pr.number);
        let raw: Vec<RawReview> = self.api.get_json(&path, "reviews").await?;
        Ok(raw
            .into_iter()
            .filter_map(|r| {
                // Pending reviews have no submission time and are not outcomes.
                let submitted_at = r.submitted_at?;
                Some(Review {
                    author: r.user.login,
                    author_role: r.author_association.unwrap_or_else(|| "NONE".to_string()),
                    verdict: r.state,
                    submitted_at,
                })
            })
            .collect())
    }

    async fn review_request_timeline(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ReviewRequest>, TrackerError> {
        let path = format!(
            "repos/{}/issues/{}/timeline?per_page=100",
            pr.repo, pr.number
        );
        let raw: Vec<RawTimelineEvent> = self.api.get_json(&path, "timeline").await?;
        Ok(raw
            .into_iter()
            .filter(|e| e.event == "review_requested")
            .filter_map(|e| {
                Some(ReviewRequest {
                    reviewer: e.requested_reviewer.map(|r| r.login),
                    created_at: e.created_at?,
                })
            })
            .collect())
    }

    async fn assignment_timeline(
        &self,
        number: u64,
    ) -> Result<Vec<AssignmentEvent>, TrackerError> {
        let raw = self.timeline(number).await?;
        Ok(raw
            .into_iter()
            .filter_map(|e| {
                let kind = match e.event.as_str() {
                    "assigned" => AssignmentEventKind::Assigned,
                    "unassigned" => AssignmentEventKind::Unassigned,
                    _ => return None,
                };
                let actor = e.actor?;
                Some(AssignmentEvent {
                    kind,
                    actor_id: actor.id,
                    actor_login: actor.login,
                    assignee: e.assignee?.login,
                    created_at: e.created_at?,
                })
            })
            .collect())
    }

    async fn is_collaborator(&self, login: &str) -> Result<bool, TrackerError> {
        let path = format!(
            "repos/{}/collaborators/{}",
            self.repo,
            urlencoding::encode(login)
        );
        let response = self.api.send(reqwest::Method::GET, &path, None).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(TrackerError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn resolve_identifier(&self, login: &str) -> Result<Option<u64>, TrackerError> {
        let path = format!("users/{}", urlencoding::encode(login));
        let response = self.api.send(reqwest::Method::GET, &path, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(login = %login, "No account found for login");
            return Ok(None);
        }
        let user: RawUser = GitHubApi::decode(response, "user").await?;
        Ok(Some(user.id))
    }

    async fn contributor_role(&self, login: &str) -> Result<String, TrackerError> {
        let path = format!(
            "repos/{}/collaborators/{}/permission",
            self.repo,
            urlencoding::encode(login)
        );
        let raw: RawPermission = self.api.get_json(&path, "permission").await?;
        Ok(role_for_permission(&raw.permission))
    }

    async fn wallet_address(&self, login: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.wallets.get(login).cloned())
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let path = format!("repos/{}/issues/{number}/comments", self.repo);
        let response = self
            .api
            .send(reqwest::Method::POST, &path, Some(json!({ "body": body })))
            .await?;
        GitHubApi::expect_success(response).await
    }
}
