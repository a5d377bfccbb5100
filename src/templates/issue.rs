use crate::mapping::priority::{issue_labels, Priority};
use crate::model::issue::IssueDraft;
use crate::model::task::Task;
use crate::util::text::truncate_to;

const MAX_TITLE_CHARS: usize = 100;
const UNTITLED: &str = "Bug without description";

/// First non-blank line of the description, or a fallback when there is none.
pub fn build_title(task: &Task) -> String {
    let first_line = task
        .description
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNTITLED);
    truncate_to(first_line, MAX_TITLE_CHARS)
}

pub fn build_body(task: &Task) -> String {
    let selector = task.selector_info.clone().unwrap_or_default();
    let unknown = || "Unknown".to_string();

    let screenshot = task
        .screenshot_url
        .as_deref()
        .map(|url| format!("### Screenshot\n![Bug screenshot]({url})"))
        .unwrap_or_default();

    let description = if task.description.trim().is_empty() {
        "No description"
    } else {
        task.description.as_str()
    };

    format!(
        r#"## 🐛 Bug Report

**URL:** {url}
**Reported by:** {reporter}
**Priority:** {priority}
**BugHerd task:** #{local_id}

---

### Description
{description}

---

{screenshot}

---

### Environment
| Field | Value |
|-------|-------|
| Browser | {browser} |
| OS | {os} |
| Resolution | {resolution} |

---

### Links
- 🔗 [View in BugHerd]({admin_link})
"#,
        url = task.url.as_deref().unwrap_or("N/A"),
        reporter = task.requester_email.as_deref().unwrap_or("Unknown"),
        priority = Priority::from_code(task.priority_id).label(),
        local_id = task.local_task_id,
        browser = selector.browser.unwrap_or_else(unknown),
        os = selector.os.unwrap_or_else(unknown),
        resolution = selector.resolution.unwrap_or_else(unknown),
        admin_link = task.admin_link,
    )
}

/// Title, body and labels for the issue mirroring `task`.
pub fn build_draft(task: &Task) -> IssueDraft {
    IssueDraft {
        title: build_title(task),
        body: build_body(task),
        labels: issue_labels(task.priority_id),
    }
}
