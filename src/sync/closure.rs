use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{Outcome, SkipReason, SyncContext};
use crate::mapping::projects::ProjectLink;
use crate::model::issue::{Issue, IssueTransition, IssuesWebhook};
use crate::model::task::Task;
use crate::templates::notification::{issue_closed, ClosedIssue};

/// Column a task returns to when its issue is reopened.
pub const IN_PROGRESS_COLUMN: &str = "doing";

/// Mirrors an issue being closed or reopened onto the linked BugHerd task.
pub async fn sync_issue_transition(ctx: &SyncContext, hook: &IssuesWebhook) -> Result<Outcome> {
    let Some(transition) = IssueTransition::from_action(&hook.action) else {
        info!(action = %hook.action, "Issue action ignored");
        return Ok(Outcome::ignored(SkipReason::UnhandledEvent));
    };

    let repo = hook.repository.repo_ref();
    let Some(project) = ctx.projects.by_repo(&repo.owner, &repo.name) else {
        info!(repo = %repo, "Repository not mapped, ignoring");
        return Ok(Outcome::ignored(SkipReason::NotManaged));
    };

    let issue = &hook.issue;
    let task = ctx
        .tasks
        .find_task_by_external_id(project.bugherd_project_id, &issue.number.to_string())
        .await
        .with_context(|| format!("Failed to look up BugHerd task for issue #{}", issue.number))?;

    let Some(task) = task else {
        info!(issue_number = issue.number, "No BugHerd task linked to issue");
        return Ok(outcome(transition, None, None));
    };

    let column = match transition {
        IssueTransition::Closed => project.closed_column.as_str(),
        IssueTransition::Reopened => IN_PROGRESS_COLUMN,
    };

    ctx.tasks
        .move_task_to_column(project.bugherd_project_id, task.id, column)
        .await
        .with_context(|| format!("Failed to move BugHerd task {} to \"{column}\"", task.id))?;
    info!(
        task_id = task.id,
        local_task_id = task.local_task_id,
        column = %column,
        "Moved BugHerd task"
    );

    if transition == IssueTransition::Closed {
        celebrate(ctx, project, issue, &task).await;
    }

    Ok(outcome(transition, Some(task.id), Some(column.to_string())))
}

fn outcome(transition: IssueTransition, task_id: Option<u64>, new_status: Option<String>) -> Outcome {
    match transition {
        IssueTransition::Closed => Outcome::Closed {
            task_id,
            new_status,
        },
        IssueTransition::Reopened => Outcome::Reopened {
            task_id,
            new_status,
        },
    }
}

async fn celebrate(ctx: &SyncContext, project: &ProjectLink, issue: &Issue, task: &Task) {
    let Some(url) = ctx
        .channels
        .webhook_url(project.notification_channel.as_deref())
    else {
        return;
    };

    let closed_by = issue
        .first_assignee()
        .and_then(|login| ctx.developers.discord_id_for(login));

    let pull_request = match ctx.issues.linked_pull_request(&project.repo(), issue.number).await {
        Ok(pr) => pr,
        Err(e) => {
            warn!(issue_number = issue.number, error = %format!("{e:#}"), "Could not fetch linked pull request");
            None
        }
    };

    let notification = issue_closed(ClosedIssue {
        issue,
        closed_by_discord_id: closed_by,
        pull_request: pull_request.as_ref(),
        task_admin_link: &task.admin_link,
        celebration: ctx.celebrations.pick(),
    });
    ctx.notify(url, &notification).await;
}
