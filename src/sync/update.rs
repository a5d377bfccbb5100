use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{Outcome, SkipReason, SyncContext};
use crate::model::issue::IssuePatch;
use crate::model::task::Task;
use crate::templates::issue::build_draft;

/// Rewrites the linked issue from the task's current fields.
///
/// Title, body and labels are overwritten wholesale. The assignee is replaced
/// when the tags name a developer and left alone otherwise.
pub async fn update_issue_for_task(ctx: &SyncContext, task: &Task) -> Result<Outcome> {
    let Some(project) = ctx.projects.by_bugherd_project(task.project_id) else {
        info!(project_id = task.project_id, "Project not mapped, ignoring");
        return Ok(Outcome::ignored(SkipReason::NotManaged));
    };

    let Some(linked) = task.linked_issue() else {
        info!(task_id = task.id, "Task has no linked issue, nothing to update");
        return Ok(Outcome::ignored(SkipReason::NotLinked));
    };

    let Ok(number) = linked.parse::<u64>() else {
        warn!(task_id = task.id, external_id = %linked, "external_id is not an issue number");
        return Ok(Outcome::ignored(SkipReason::MalformedLink));
    };

    let repo = project.repo();
    let patch = IssuePatch::from(build_draft(task));
    let issue = ctx
        .issues
        .update_issue(&repo, number, &patch)
        .await
        .with_context(|| format!("Failed to update GitHub issue #{number}"))?;
    info!(repo = %repo, issue_number = number, task_id = task.id, "Updated GitHub issue");

    if let Some(dev) = ctx.developers.resolve(&task.tag_names) {
        let assignees = [dev.github_username.clone()];
        if let Err(e) = ctx.issues.assign_issue(&repo, number, &assignees).await {
            warn!(
                issue_number = number,
                assignee = %dev.github_username,
                error = %format!("{e:#}"),
                "Failed to reassign issue"
            );
        }
    }

    Ok(Outcome::Updated {
        issue_number: number,
        issue_url: issue.html_url,
    })
}
