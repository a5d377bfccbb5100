use serde::{Deserialize, Deserializer, Serialize};

/// A bug record as BugHerd sends it in webhooks and returns it from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub local_task_id: u64,
    pub project_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub priority_id: Option<u32>,
    #[serde(default)]
    pub status_id: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Linked GitHub issue number, written back after the issue is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub admin_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector_info: Option<SelectorInfo>,
}

impl Task {
    /// The linked issue identifier, ignoring blank values BugHerd sometimes sends.
    pub fn linked_issue(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorInfo {
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskWebhook {
    #[serde(default)]
    pub event: Option<String>,
    pub task: Task,
}

/// What a BugHerd delivery asks the bridge to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Create,
    Update,
    Ignore(String),
}

impl TaskWebhook {
    /// Explicit event names win; without one, an unlinked task is treated as new.
    pub fn classify(&self) -> TaskEvent {
        match self.event.as_deref() {
            Some("task_create") => TaskEvent::Create,
            Some("task_update") => TaskEvent::Update,
            Some(other) => TaskEvent::Ignore(other.to_string()),
            None if self.task.linked_issue().is_some() => TaskEvent::Update,
            None => TaskEvent::Create,
        }
    }
}
