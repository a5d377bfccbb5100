//! Shared fixtures for flow tests: a context wired to recording mocks.

use std::collections::HashMap;
use std::sync::Arc;

use crate::mapping::channels::ChannelDirectory;
use crate::mapping::developers::{Developer, DeveloperDirectory};
use crate::mapping::projects::{ProjectDirectory, ProjectLink};
use crate::model::task::Task;
use crate::providers::tests::{Call, CallLog, MockBugherd, MockDiscord, MockGitHub};
use crate::sync::SyncContext;
use crate::templates::notification::{Celebration, CelebrationPicker};

pub const MANAGED_PROJECT: u64 = 464238;
pub const QUIET_PROJECT: u64 = 500;
pub const UNMANAGED_PROJECT: u64 = 999;
pub const CHANNEL_URL: &str = "https://discord.test/api/webhooks/bugs";

pub struct FixedCelebration(pub Celebration);

impl CelebrationPicker for FixedCelebration {
    fn pick(&self) -> Celebration {
        self.0
    }
}

pub fn projects() -> ProjectDirectory {
    ProjectDirectory::new(vec![
        ProjectLink {
            bugherd_project_id: MANAGED_PROJECT,
            github_owner: "Acme".into(),
            github_repo: "web-app".into(),
            notification_channel: Some("bugs".into()),
            closed_column: "in review".into(),
        },
        ProjectLink {
            bugherd_project_id: QUIET_PROJECT,
            github_owner: "Acme".into(),
            github_repo: "api".into(),
            notification_channel: None,
            closed_column: "done".into(),
        },
    ])
}

pub fn developers() -> DeveloperDirectory {
    DeveloperDirectory::new(vec![
        Developer {
            tag: "DEV Jane Doe".into(),
            github_username: "janedoe".into(),
            discord_id: Some("1001".into()),
        },
        Developer {
            tag: "DEV John Roe".into(),
            github_username: "johnroe".into(),
            discord_id: None,
        },
    ])
}

pub fn task(project_id: u64) -> Task {
    Task {
        id: 9001,
        local_task_id: 17,
        project_id,
        description: "Login button does nothing\nClicking it on Safari has no effect".into(),
        priority_id: Some(1),
        status_id: None,
        tag_names: vec![],
        screenshot_url: None,
        url: Some("https://app.acme.test/login".into()),
        external_id: None,
        admin_link: "https://www.bugherd.com/projects/464238/tasks/17".into(),
        requester_email: Some("qa@acme.test".into()),
        selector_info: None,
    }
}

pub struct Harness {
    pub ctx: Arc<SyncContext>,
    log: CallLog,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MockGitHub::new, MockBugherd::new, MockDiscord::new)
    }

    pub fn with(
        github: impl FnOnce(CallLog) -> MockGitHub,
        bugherd: impl FnOnce(CallLog) -> MockBugherd,
        discord: impl FnOnce(CallLog) -> MockDiscord,
    ) -> Self {
        let log = CallLog::default();
        let ctx = Arc::new(SyncContext {
            issues: Arc::new(github(log.clone())),
            tasks: Arc::new(bugherd(log.clone())),
            notifier: Arc::new(discord(log.clone())),
            projects: projects(),
            developers: developers(),
            channels: ChannelDirectory::new(HashMap::from([(
                "bugs".to_string(),
                CHANNEL_URL.to_string(),
            )])),
            celebrations: Arc::new(FixedCelebration(Celebration::Squashed)),
        });
        Self { ctx, log }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Notify { .. }))
            .collect()
    }
}
