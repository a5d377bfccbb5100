use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner/name pair addressing a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    #[serde(default)]
    pub assignees: Vec<GitHubUser>,
}

impl Issue {
    pub fn first_assignee(&self) -> Option<&str> {
        self.assignees.first().map(|user| user.login.as_str())
    }
}

/// Fields for a new issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Partial issue update; absent fields are left untouched by GitHub.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl From<IssueDraft> for IssuePatch {
    fn from(draft: IssueDraft) -> Self {
        Self {
            title: Some(draft.title),
            body: Some(draft.body),
            labels: Some(draft.labels),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: RepositoryOwner,
}

impl Repository {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner.login, &self.name)
    }
}

/// Body of an `issues` webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesWebhook {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
}

/// Body of a `pull_request` webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestWebhook {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

/// The two issue transitions mirrored onto BugHerd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueTransition {
    Closed,
    Reopened,
}

impl IssueTransition {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "closed" => Some(IssueTransition::Closed),
            "reopened" => Some(IssueTransition::Reopened),
            _ => None,
        }
    }
}
