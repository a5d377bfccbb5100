use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::IssueTracker;
use crate::error::ApiError;
use crate::model::issue::{Issue, IssueDraft, IssuePatch, PullRequest, RepoRef};

const API_BASE: &str = "https://api.github.com";
const SERVICE: &str = "GitHub";

pub struct GitHubClient {
    token: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{API_BASE}{path}"))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", concat!("bugherd-sync/", env!("CARGO_PKG_VERSION")))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.send().await.context("GitHub API request failed")?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(SERVICE, resp).await.into());
        }
        resp.json().await.context("Failed to parse GitHub response")
    }

    pub async fn list_hooks(&self, repo: &RepoRef) -> Result<Vec<RepoHook>> {
        let path = format!("/repos/{}/{}/hooks", repo.owner, repo.name);
        self.send(self.request(Method::GET, &path)).await
    }

    /// Registers a JSON `web` hook for the events the bridge consumes.
    pub async fn create_hook(&self, repo: &RepoRef, url: &str, secret: &str) -> Result<RepoHook> {
        let path = format!("/repos/{}/{}/hooks", repo.owner, repo.name);
        let body = json!({
            "name": "web",
            "active": true,
            "events": ["issues", "pull_request"],
            "config": {
                "url": url,
                "content_type": "json",
                "secret": secret,
            },
        });
        self.send(self.request(Method::POST, &path).json(&body)).await
    }
}

#[derive(Debug, Deserialize)]
pub struct RepoHook {
    pub id: u64,
    #[serde(default)]
    pub events: Vec<String>,
    pub config: HookConfig,
}

#[derive(Debug, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct TimelineEvent {
    event: Option<String>,
    source: Option<TimelineSource>,
}

#[derive(Deserialize)]
struct TimelineSource {
    issue: Option<TimelineIssue>,
}

#[derive(Deserialize)]
struct TimelineIssue {
    number: u64,
    title: String,
    html_url: String,
    body: Option<String>,
    pull_request: Option<serde_json::Value>,
}

/// Most recent pull request that cross-referenced the issue.
fn latest_cross_referenced_pr(events: Vec<TimelineEvent>) -> Option<PullRequest> {
    events
        .into_iter()
        .filter(|e| e.event.as_deref() == Some("cross-referenced"))
        .filter_map(|e| e.source.and_then(|s| s.issue))
        .filter(|issue| issue.pull_request.is_some())
        .last()
        .map(|issue| PullRequest {
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url,
            body: issue.body,
        })
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn create_issue(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<Issue> {
        let path = format!("/repos/{}/{}/issues", repo.owner, repo.name);
        self.send(self.request(Method::POST, &path).json(draft))
            .await
            .with_context(|| format!("Failed to create issue in {repo}"))
    }

    async fn update_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        patch: &IssuePatch,
    ) -> Result<Issue> {
        let path = format!("/repos/{}/{}/issues/{number}", repo.owner, repo.name);
        self.send(self.request(Method::PATCH, &path).json(patch))
            .await
            .with_context(|| format!("Failed to update issue {repo}#{number}"))
    }

    async fn assign_issue(&self, repo: &RepoRef, number: u64, assignees: &[String]) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/issues/{number}/assignees",
            repo.owner, repo.name
        );
        let _: serde_json::Value = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "assignees": assignees })),
            )
            .await
            .with_context(|| format!("Failed to assign issue {repo}#{number}"))?;
        Ok(())
    }

    async fn linked_pull_request(&self, repo: &RepoRef, number: u64) -> Result<Option<PullRequest>> {
        let path = format!(
            "/repos/{}/{}/issues/{number}/timeline",
            repo.owner, repo.name
        );
        let events: Vec<TimelineEvent> = self
            .send(self.request(Method::GET, &path).query(&[("per_page", "100")]))
            .await
            .with_context(|| format!("Failed to read timeline of {repo}#{number}"))?;
        Ok(latest_cross_referenced_pr(events))
    }
}
