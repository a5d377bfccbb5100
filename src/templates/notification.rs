use rand::Rng;

use crate::mapping::priority::Priority;
use crate::model::issue::{Issue, PullRequest};
use crate::model::notification::{Color, LinkButton, Notification, NotificationField};
use crate::model::task::Task;
use crate::util::text::preview;

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

pub const FIELD_TITLE: &str = "📋 Title";
pub const FIELD_ASSIGNEE: &str = "👤 Assigned to";
pub const FIELD_PRIORITY: &str = "🔥 Priority";
pub const FIELD_ISSUE: &str = "🔗 Issue";
pub const FIELD_DESCRIPTION: &str = "📝 Description";
pub const FIELD_CLOSED_BY: &str = "🦸 Closed by";
pub const FIELD_PULL_REQUEST: &str = "🔀 Pull Request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    Squashed,
    Victory,
    OneLess,
    Eliminated,
    Exterminated,
}

impl Celebration {
    pub const ALL: [Celebration; 5] = [
        Celebration::Squashed,
        Celebration::Victory,
        Celebration::OneLess,
        Celebration::Eliminated,
        Celebration::Exterminated,
    ];

    pub fn headline(&self) -> &'static str {
        match self {
            Celebration::Squashed => "🎉 Bug squashed!",
            Celebration::Victory => "🏆 Victory over the bugs!",
            Celebration::OneLess => "💪 One less bug in the world!",
            Celebration::Eliminated => "🚀 Bug eliminated!",
            Celebration::Exterminated => "⚡ Bug exterminated!",
        }
    }
}

/// Chooses the headline of an issue-closed notification.
pub trait CelebrationPicker: Send + Sync {
    fn pick(&self) -> Celebration;
}

pub struct RandomCelebration;

impl CelebrationPicker for RandomCelebration {
    fn pick(&self) -> Celebration {
        let index = rand::thread_rng().gen_range(0..Celebration::ALL.len());
        Celebration::ALL[index]
    }
}

/// Who a freshly created issue went to, as shown in chat.
pub fn assignee_mention(discord_id: Option<&str>, github_username: Option<&str>) -> String {
    match (discord_id, github_username) {
        (Some(id), _) => format!("<@{id}>"),
        (None, Some(login)) => format!("@{login}"),
        (None, None) => "Unassigned".to_string(),
    }
}

pub fn new_bug(task: &Task, issue: &Issue, assignee: &str) -> Notification {
    let description = if task.description.trim().is_empty() {
        "No description".to_string()
    } else {
        preview(&task.description, DESCRIPTION_PREVIEW_CHARS)
    };

    Notification {
        title: "🐛 New bug reported".to_string(),
        color: Color::Red,
        fields: vec![
            NotificationField::new(FIELD_TITLE, &issue.title),
            NotificationField::inline(FIELD_ASSIGNEE, assignee),
            NotificationField::inline(
                FIELD_PRIORITY,
                Priority::from_code(task.priority_id).label(),
            ),
            NotificationField::new(FIELD_ISSUE, &issue.html_url),
            NotificationField::new(FIELD_DESCRIPTION, description),
        ],
        image_url: task.screenshot_url.clone(),
        footer: Some("BugHerd → GitHub".to_string()),
        buttons: vec![
            LinkButton::new("View on GitHub", &issue.html_url),
            LinkButton::new("View in BugHerd", &task.admin_link),
        ],
    }
}

pub struct ClosedIssue<'a> {
    pub issue: &'a Issue,
    pub closed_by_discord_id: Option<&'a str>,
    pub pull_request: Option<&'a PullRequest>,
    pub task_admin_link: &'a str,
    pub celebration: Celebration,
}

pub fn issue_closed(closed: ClosedIssue<'_>) -> Notification {
    let issue = closed.issue;
    let closed_by = closed
        .closed_by_discord_id
        .map(|id| format!("<@{id}>"))
        .unwrap_or_else(|| "A developer".to_string());

    let mut fields = vec![
        NotificationField::new(FIELD_TITLE, &issue.title),
        NotificationField::inline(FIELD_CLOSED_BY, closed_by),
        NotificationField::inline(
            FIELD_ISSUE,
            format!("[#{}]({})", issue.number, issue.html_url),
        ),
    ];
    let mut buttons = vec![LinkButton::new("View issue", &issue.html_url)];

    if let Some(pr) = closed.pull_request {
        fields.push(NotificationField::new(
            FIELD_PULL_REQUEST,
            format!("[#{} - {}]({})", pr.number, pr.title, pr.html_url),
        ));
        buttons.push(LinkButton::new("View PR", &pr.html_url));
    }
    buttons.push(LinkButton::new("View in BugHerd", closed.task_admin_link));

    Notification {
        title: format!("✅ Issue closed - {}", closed.celebration.headline()),
        color: Color::Green,
        fields,
        image_url: None,
        footer: Some("GitHub → BugHerd".to_string()),
        buttons,
    }
}

/// Comment appended to a BugHerd task when a pull request mentions its issue.
pub fn pull_request_comment(pr: &PullRequest) -> String {
    format!(
        "🔀 Pull request #{number} opened: {title}\n{url}",
        number = pr.number,
        title = pr.title,
        url = pr.html_url,
    )
}
