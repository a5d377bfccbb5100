use serde::Deserialize;

use crate::model::issue::RepoRef;

/// Static binding between a BugHerd project and a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectLink {
    pub bugherd_project_id: u64,
    pub github_owner: String,
    pub github_repo: String,
    /// Key into the Discord webhook table; no key means no notifications.
    #[serde(default)]
    pub notification_channel: Option<String>,
    /// Column a task moves to when its issue closes.
    pub closed_column: String,
}

impl ProjectLink {
    pub fn repo(&self) -> RepoRef {
        RepoRef::new(&self.github_owner, &self.github_repo)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    projects: Vec<ProjectLink>,
}

impl ProjectDirectory {
    pub fn new(projects: Vec<ProjectLink>) -> Self {
        Self { projects }
    }

    pub fn by_bugherd_project(&self, project_id: u64) -> Option<&ProjectLink> {
        self.projects
            .iter()
            .find(|project| project.bugherd_project_id == project_id)
    }

    pub fn by_repo(&self, owner: &str, repo: &str) -> Option<&ProjectLink> {
        self.projects
            .iter()
            .find(|project| project.github_owner == owner && project.github_repo == repo)
    }

    pub fn all(&self) -> &[ProjectLink] {
        &self.projects
    }
}
