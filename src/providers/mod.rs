pub mod bugherd;
pub mod discord;
pub mod github;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::issue::{Issue, IssueDraft, IssuePatch, PullRequest, RepoRef};
use crate::model::notification::Notification;
use crate::model::task::Task;

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn create_issue(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<Issue>;
    async fn update_issue(&self, repo: &RepoRef, number: u64, patch: &IssuePatch)
        -> Result<Issue>;
    async fn assign_issue(&self, repo: &RepoRef, number: u64, assignees: &[String])
        -> Result<()>;
    /// The pull request that references an issue, if any.
    async fn linked_pull_request(&self, repo: &RepoRef, number: u64)
        -> Result<Option<PullRequest>>;
}

#[async_trait]
pub trait BugTracker: Send + Sync {
    async fn find_task_by_external_id(
        &self,
        project_id: u64,
        external_id: &str,
    ) -> Result<Option<Task>>;
    async fn set_task_external_id(&self, project_id: u64, task_id: u64, external_id: &str)
        -> Result<()>;
    async fn move_task_to_column(&self, project_id: u64, task_id: u64, column: &str)
        -> Result<()>;
    async fn add_task_comment(&self, project_id: u64, task_id: u64, text: &str) -> Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, webhook_url: &str, notification: &Notification) -> Result<()>;
}

#[cfg(test)]
pub mod tests;
