use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::{BugTracker, IssueTracker, Notifier};
use crate::model::issue::{Issue, IssueDraft, IssuePatch, PullRequest, RepoRef};
use crate::model::notification::Notification;
use crate::model::task::Task;

/// Every outbound call a flow made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateIssue { repo: String, draft: IssueDraft },
    UpdateIssue { repo: String, number: u64, patch: IssuePatch },
    AssignIssue { repo: String, number: u64, assignees: Vec<String> },
    LinkedPullRequest { repo: String, number: u64 },
    FindTask { project_id: u64, external_id: String },
    SetExternalId { project_id: u64, task_id: u64, external_id: String },
    MoveTask { project_id: u64, task_id: u64, column: String },
    AddComment { project_id: u64, task_id: u64, text: String },
    Notify { webhook_url: String, notification: Notification },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

fn record(log: &CallLog, call: Call) {
    log.lock().unwrap().push(call);
}

fn fail_if(failing: &HashSet<&'static str>, op: &'static str) -> Result<()> {
    if failing.contains(op) {
        anyhow::bail!("Mock {op} failure");
    }
    Ok(())
}

/// A GitHub stand-in that numbers new issues sequentially.
pub struct MockGitHub {
    log: CallLog,
    next_number: AtomicU64,
    failing: HashSet<&'static str>,
    pub linked_pr: Option<PullRequest>,
}

impl MockGitHub {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            next_number: AtomicU64::new(100),
            failing: HashSet::new(),
            linked_pr: None,
        }
    }

    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }
}

fn issue(repo: &RepoRef, number: u64, title: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: None,
        html_url: format!("https://github.com/{repo}/issues/{number}"),
        state: Some("open".into()),
        labels: vec![],
        assignees: vec![],
    }
}

#[async_trait]
impl IssueTracker for MockGitHub {
    async fn create_issue(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<Issue> {
        record(
            &self.log,
            Call::CreateIssue {
                repo: repo.to_string(),
                draft: draft.clone(),
            },
        );
        fail_if(&self.failing, "create_issue")?;
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        Ok(issue(repo, number, &draft.title))
    }

    async fn update_issue(&self, repo: &RepoRef, number: u64, patch: &IssuePatch) -> Result<Issue> {
        record(
            &self.log,
            Call::UpdateIssue {
                repo: repo.to_string(),
                number,
                patch: patch.clone(),
            },
        );
        fail_if(&self.failing, "update_issue")?;
        Ok(issue(repo, number, patch.title.as_deref().unwrap_or_default()))
    }

    async fn assign_issue(&self, repo: &RepoRef, number: u64, assignees: &[String]) -> Result<()> {
        record(
            &self.log,
            Call::AssignIssue {
                repo: repo.to_string(),
                number,
                assignees: assignees.to_vec(),
            },
        );
        fail_if(&self.failing, "assign_issue")
    }

    async fn linked_pull_request(&self, repo: &RepoRef, number: u64) -> Result<Option<PullRequest>> {
        record(
            &self.log,
            Call::LinkedPullRequest {
                repo: repo.to_string(),
                number,
            },
        );
        fail_if(&self.failing, "linked_pull_request")?;
        Ok(self.linked_pr.clone())
    }
}

/// A BugHerd stand-in holding a fixed set of tasks.
pub struct MockBugherd {
    log: CallLog,
    tasks: Vec<Task>,
    failing: HashSet<&'static str>,
    failing_comments: HashSet<u64>,
}

impl MockBugherd {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            tasks: Vec::new(),
            failing: HashSet::new(),
            failing_comments: HashSet::new(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }

    pub fn failing_comment_on(mut self, task_id: u64) -> Self {
        self.failing_comments.insert(task_id);
        self
    }
}

#[async_trait]
impl BugTracker for MockBugherd {
    async fn find_task_by_external_id(&self, project_id: u64, external_id: &str) -> Result<Option<Task>> {
        record(
            &self.log,
            Call::FindTask {
                project_id,
                external_id: external_id.to_string(),
            },
        );
        fail_if(&self.failing, "find_task")?;
        Ok(self
            .tasks
            .iter()
            .find(|t| t.project_id == project_id && t.linked_issue() == Some(external_id))
            .cloned())
    }

    async fn set_task_external_id(&self, project_id: u64, task_id: u64, external_id: &str) -> Result<()> {
        record(
            &self.log,
            Call::SetExternalId {
                project_id,
                task_id,
                external_id: external_id.to_string(),
            },
        );
        fail_if(&self.failing, "set_external_id")
    }

    async fn move_task_to_column(&self, project_id: u64, task_id: u64, column: &str) -> Result<()> {
        record(
            &self.log,
            Call::MoveTask {
                project_id,
                task_id,
                column: column.to_string(),
            },
        );
        fail_if(&self.failing, "move_task")
    }

    async fn add_task_comment(&self, project_id: u64, task_id: u64, text: &str) -> Result<()> {
        record(
            &self.log,
            Call::AddComment {
                project_id,
                task_id,
                text: text.to_string(),
            },
        );
        if self.failing_comments.contains(&task_id) {
            anyhow::bail!("Mock comment failure on task {task_id}");
        }
        Ok(())
    }
}

pub struct MockDiscord {
    log: CallLog,
    should_fail: bool,
}

impl MockDiscord {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            should_fail: false,
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl Notifier for MockDiscord {
    async fn send(&self, webhook_url: &str, notification: &Notification) -> Result<()> {
        record(
            &self.log,
            Call::Notify {
                webhook_url: webhook_url.to_string(),
                notification: notification.clone(),
            },
        );
        if self.should_fail {
            anyhow::bail!("Mock failure");
        }
        Ok(())
    }
}

#[tokio::test]
async fn mock_github_numbers_issues_sequentially() {
    let log = CallLog::default();
    let github = MockGitHub::new(log.clone());
    let repo = RepoRef::new("o", "r");
    let draft = IssueDraft {
        title: "t".into(),
        body: "b".into(),
        labels: vec![],
    };
    let first = github.create_issue(&repo, &draft).await.unwrap();
    let second = github.create_issue(&repo, &draft).await.unwrap();
    assert_eq!(first.number + 1, second.number);
    assert_eq!(first.html_url, "https://github.com/o/r/issues/100");
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn mock_failures_propagate_but_are_recorded() {
    let log = CallLog::default();
    let bugherd = MockBugherd::new(log.clone()).failing("move_task");
    let result = bugherd.move_task_to_column(1, 2, "done").await;
    assert!(result.unwrap_err().to_string().contains("Mock move_task failure"));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn mock_bugherd_lookup_is_scoped_to_project() {
    let log = CallLog::default();
    let task: Task = serde_json::from_value(serde_json::json!({
        "id": 1, "local_task_id": 1, "project_id": 10, "external_id": "5"
    }))
    .unwrap();
    let bugherd = MockBugherd::new(log).with_task(task);
    assert!(bugherd.find_task_by_external_id(10, "5").await.unwrap().is_some());
    assert!(bugherd.find_task_by_external_id(11, "5").await.unwrap().is_none());
}
