/// Labels every synced issue carries.
pub const BASE_LABELS: [&str; 2] = ["bug", "bugherd"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    NotSet,
    Critical,
    Important,
    Normal,
    Minor,
}

impl Priority {
    pub fn from_code(code: Option<u32>) -> Self {
        match code {
            Some(1) => Priority::Critical,
            Some(2) => Priority::Important,
            Some(3) => Priority::Normal,
            Some(4) => Priority::Minor,
            _ => Priority::NotSet,
        }
    }

    /// BugHerd's own name for the priority.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::NotSet => "not set",
            Priority::Critical => "critical",
            Priority::Important => "important",
            Priority::Normal => "normal",
            Priority::Minor => "minor",
        }
    }

    pub fn github_label(&self) -> Option<&'static str> {
        match self {
            Priority::NotSet => None,
            Priority::Critical => Some("priority: critical"),
            Priority::Important => Some("priority: high"),
            Priority::Normal => Some("priority: medium"),
            Priority::Minor => Some("priority: low"),
        }
    }
}

pub fn issue_labels(code: Option<u32>) -> Vec<String> {
    BASE_LABELS
        .iter()
        .copied()
        .chain(Priority::from_code(code).github_label())
        .map(String::from)
        .collect()
}
