use std::collections::BTreeSet;
use std::sync::OnceLock;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{info, warn};

use super::{LinkResult, Outcome, SkipReason, SyncContext};
use crate::mapping::projects::ProjectLink;
use crate::model::issue::{PullRequest, PullRequestWebhook};
use crate::templates::notification::pull_request_comment;

static ISSUE_REF_REGEX: OnceLock<Regex> = OnceLock::new();

/// BugHerd calls in flight at once while linking one pull request.
const LINK_CONCURRENCY: usize = 4;

/// Issue numbers referenced as `#<digits>` in a PR's body or title, deduplicated.
pub fn issue_references(pr: &PullRequest) -> BTreeSet<u64> {
    let regex = ISSUE_REF_REGEX.get_or_init(|| Regex::new(r"#(\d+)").expect("Invalid regex pattern"));
    let body = pr.body.as_deref().unwrap_or_default();

    [body, pr.title.as_str()]
        .into_iter()
        .flat_map(|text| regex.captures_iter(text))
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Comments on every BugHerd task whose issue a newly opened PR mentions.
///
/// Each referenced issue is handled on its own; one failing never stops the
/// others, and failures are reported per issue rather than as an error.
pub async fn link_pull_request(ctx: &SyncContext, hook: &PullRequestWebhook) -> Result<Outcome> {
    if hook.action != "opened" {
        info!(action = %hook.action, "Pull request action ignored");
        return Ok(Outcome::ignored(SkipReason::UnhandledEvent));
    }

    let repo = hook.repository.repo_ref();
    let Some(project) = ctx.projects.by_repo(&repo.owner, &repo.name) else {
        info!(repo = %repo, "Repository not mapped, ignoring");
        return Ok(Outcome::ignored(SkipReason::NotManaged));
    };

    let pr = &hook.pull_request;
    let references = issue_references(pr);
    if references.is_empty() {
        info!(pr_number = pr.number, "Pull request references no issues");
        return Ok(Outcome::ignored(SkipReason::NoIssueReferences));
    }

    let comment = pull_request_comment(pr);
    let results: Vec<LinkResult> = stream::iter(references)
        .map(|number| link_one(ctx, project, number, &comment))
        .buffered(LINK_CONCURRENCY)
        .collect()
        .await;

    let linked = results.iter().filter(|r| r.success).count();
    info!(pr_number = pr.number, linked, total = results.len(), "Linked pull request to tasks");

    Ok(Outcome::PullRequestLinked {
        pr_number: pr.number,
        results,
    })
}

async fn link_one(ctx: &SyncContext, project: &ProjectLink, issue_number: u64, comment: &str) -> LinkResult {
    let project_id = project.bugherd_project_id;
    let failed = |task_id: Option<u64>, error: String| LinkResult {
        issue_number,
        success: false,
        task_id,
        error: Some(error),
    };

    let task = match ctx
        .tasks
        .find_task_by_external_id(project_id, &issue_number.to_string())
        .await
    {
        Ok(Some(task)) => task,
        Ok(None) => return failed(None, "task not found".to_string()),
        Err(e) => {
            warn!(issue_number, error = %format!("{e:#}"), "Task lookup failed");
            return failed(None, format!("{e:#}"));
        }
    };

    match ctx.tasks.add_task_comment(project_id, task.id, comment).await {
        Ok(()) => LinkResult {
            issue_number,
            success: true,
            task_id: Some(task.id),
            error: None,
        },
        Err(e) => {
            warn!(issue_number, task_id = task.id, error = %format!("{e:#}"), "Failed to comment on task");
            failed(Some(task.id), format!("{e:#}"))
        }
    }
}
