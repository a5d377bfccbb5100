//! Webhook-driven synchronization between BugHerd tasks, GitHub issues and
//! Discord notifications.
//!
//! Every flow is stateless: it rebuilds what it needs from the delivery, the
//! static directories and live reads against the two trackers. The task's
//! `external_id` is the only link between a task and its issue.

pub mod closure;
pub mod intake;
pub mod pr_link;
pub mod update;

#[cfg(test)]
pub mod harness;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::mapping::channels::ChannelDirectory;
use crate::mapping::developers::DeveloperDirectory;
use crate::mapping::projects::ProjectDirectory;
use crate::model::notification::Notification;
use crate::model::task::{TaskEvent, TaskWebhook};
use crate::providers::{BugTracker, IssueTracker, Notifier};
use crate::templates::notification::CelebrationPicker;

/// Everything a flow needs, built once at startup and shared by all requests.
pub struct SyncContext {
    pub issues: Arc<dyn IssueTracker>,
    pub tasks: Arc<dyn BugTracker>,
    pub notifier: Arc<dyn Notifier>,
    pub projects: ProjectDirectory,
    pub developers: DeveloperDirectory,
    pub channels: ChannelDirectory,
    pub celebrations: Arc<dyn CelebrationPicker>,
}

impl SyncContext {
    /// Sends a notification; failures are logged and never fail the flow.
    async fn notify(&self, webhook_url: &str, notification: &Notification) {
        match self.notifier.send(webhook_url, notification).await {
            Ok(()) => info!(title = %notification.title, "Sent Discord notification"),
            Err(e) => warn!(error = %format!("{e:#}"), "Discord notification failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotManaged,
    UnhandledEvent,
    NotLinked,
    MalformedLink,
    NoIssueReferences,
}

/// Per-issue result of linking a pull request to BugHerd tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResult {
    pub issue_number: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a flow did, reported back to the webhook sender.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Outcome {
    Ignored {
        reason: SkipReason,
    },
    Created {
        issue_number: u64,
        issue_url: String,
    },
    Updated {
        issue_number: u64,
        issue_url: String,
    },
    Closed {
        task_id: Option<u64>,
        new_status: Option<String>,
    },
    Reopened {
        task_id: Option<u64>,
        new_status: Option<String>,
    },
    PullRequestLinked {
        pr_number: u64,
        results: Vec<LinkResult>,
    },
}

impl Outcome {
    pub fn ignored(reason: SkipReason) -> Self {
        Outcome::Ignored { reason }
    }
}

/// Routes a BugHerd delivery to the intake or update flow.
pub async fn handle_task_webhook(ctx: &SyncContext, hook: &TaskWebhook) -> Result<Outcome> {
    match hook.classify() {
        TaskEvent::Create => intake::create_issue_for_task(ctx, &hook.task).await,
        TaskEvent::Update => update::update_issue_for_task(ctx, &hook.task).await,
        TaskEvent::Ignore(event) => {
            info!(event = %event, task_id = hook.task.id, "BugHerd event ignored");
            Ok(Outcome::ignored(SkipReason::UnhandledEvent))
        }
    }
}
