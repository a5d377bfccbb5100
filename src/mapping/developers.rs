use serde::Deserialize;

/// One BugHerd tag bound to a GitHub account and, optionally, a Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Developer {
    pub tag: String,
    pub github_username: String,
    #[serde(default)]
    pub discord_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeveloperDirectory {
    developers: Vec<Developer>,
}

impl DeveloperDirectory {
    pub fn new(developers: Vec<Developer>) -> Self {
        Self { developers }
    }

    /// First tag (in the task's order) that names a known developer wins.
    pub fn resolve<S: AsRef<str>>(&self, tags: &[S]) -> Option<&Developer> {
        tags.iter().find_map(|tag| {
            let tag = tag.as_ref().trim();
            self.developers.iter().find(|dev| dev.tag == tag)
        })
    }

    pub fn discord_id_for(&self, github_username: &str) -> Option<&str> {
        self.developers
            .iter()
            .find(|dev| dev.github_username == github_username)
            .and_then(|dev| dev.discord_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.developers.len()
    }
}
