use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{Outcome, SkipReason, SyncContext};
use crate::model::task::Task;
use crate::templates::issue::build_draft;
use crate::templates::notification::{assignee_mention, new_bug};

/// Opens a GitHub issue for a new BugHerd task and links the two.
///
/// Only issue creation and the `external_id` write-back are fatal. Assignment
/// and the Discord notification are best effort. A redelivery that arrives
/// before the write-back lands creates a second issue.
pub async fn create_issue_for_task(ctx: &SyncContext, task: &Task) -> Result<Outcome> {
    let Some(project) = ctx.projects.by_bugherd_project(task.project_id) else {
        info!(project_id = task.project_id, "Project not mapped, ignoring");
        return Ok(Outcome::ignored(SkipReason::NotManaged));
    };

    let repo = project.repo();
    let developer = ctx.developers.resolve(&task.tag_names);
    let draft = build_draft(task);

    let issue = ctx
        .issues
        .create_issue(&repo, &draft)
        .await
        .context("Failed to create GitHub issue")?;
    info!(repo = %repo, issue_number = issue.number, task_id = task.id, "Created GitHub issue");

    if let Some(dev) = developer {
        let assignees = [dev.github_username.clone()];
        match ctx.issues.assign_issue(&repo, issue.number, &assignees).await {
            Ok(()) => info!(issue_number = issue.number, assignee = %dev.github_username, "Assigned issue"),
            Err(e) => warn!(
                issue_number = issue.number,
                assignee = %dev.github_username,
                error = %format!("{e:#}"),
                "Failed to assign issue"
            ),
        }
    }

    ctx.tasks
        .set_task_external_id(task.project_id, task.id, &issue.number.to_string())
        .await
        .with_context(|| {
            format!(
                "Created issue #{} but failed to link it to BugHerd task {}",
                issue.number, task.id
            )
        })?;
    info!(task_id = task.id, issue_number = issue.number, "Linked BugHerd task to issue");

    if let Some(url) = ctx
        .channels
        .webhook_url(project.notification_channel.as_deref())
    {
        let mention = assignee_mention(
            developer.and_then(|d| d.discord_id.as_deref()),
            developer.map(|d| d.github_username.as_str()),
        );
        ctx.notify(url, &new_bug(task, &issue, &mention)).await;
    }

    Ok(Outcome::Created {
        issue_number: issue.number,
        issue_url: issue.html_url,
    })
}
