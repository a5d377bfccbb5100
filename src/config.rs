use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::mapping::channels::ChannelDirectory;
use crate::mapping::developers::{Developer, DeveloperDirectory};
use crate::mapping::projects::{ProjectDirectory, ProjectLink};

pub const CONFIG_PATH_ENV: &str = "BUGHERD_SYNC_CONFIG";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub bugherd: BugherdConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub projects: Vec<ProjectLink>,
    #[serde(default)]
    pub developers: Vec<Developer>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BugherdConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DiscordConfig {
    /// Notification channel key -> webhook URL.
    #[serde(default)]
    pub webhooks: HashMap<String, String>,
}

/// Credentials every command that talks to the outside world needs.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub github_token: String,
    pub webhook_secret: String,
    pub bugherd_api_key: String,
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bugherd-sync")
        .join("config.toml")
}

/// Reads the config file, then lets the process environment override secrets.
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&config_path())?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(value: &Option<String>, what: &str) -> Result<String> {
    non_empty(value.clone())
        .with_context(|| format!("Missing {what}. Set it in the config file or the environment"))
}

impl AppConfig {
    /// Environment variables win over file values when set and non-empty.
    pub fn apply_env(&mut self, get_env: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| non_empty(get_env(key));
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(secret) = get("GITHUB_WEBHOOK_SECRET") {
            self.github.webhook_secret = Some(secret);
        }
        if let Some(key) = get("BUGHERD_API_KEY") {
            self.bugherd.api_key = Some(key);
        }
        if let Some(bind) = get("BIND_ADDR") {
            self.server.bind = Some(bind);
        }
    }

    pub fn bind_addr(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn github_token(&self) -> Result<String> {
        require(&self.github.token, "GitHub token (GITHUB_TOKEN)")
    }

    pub fn webhook_secret(&self) -> Result<String> {
        require(
            &self.github.webhook_secret,
            "GitHub webhook secret (GITHUB_WEBHOOK_SECRET)",
        )
    }

    pub fn bugherd_api_key(&self) -> Result<String> {
        require(&self.bugherd.api_key, "BugHerd API key (BUGHERD_API_KEY)")
    }

    pub fn secrets(&self) -> Result<Secrets> {
        Ok(Secrets {
            github_token: self.github_token()?,
            webhook_secret: self.webhook_secret()?,
            bugherd_api_key: self.bugherd_api_key()?,
        })
    }

    pub fn project_directory(&self) -> ProjectDirectory {
        ProjectDirectory::new(self.projects.clone())
    }

    pub fn developer_directory(&self) -> DeveloperDirectory {
        DeveloperDirectory::new(self.developers.clone())
    }

    /// Webhook URLs for every channel a project names. Keys missing from
    /// `[discord.webhooks]` are looked up as environment variable names.
    pub fn channel_directory(&self, get_env: impl Fn(&str) -> Option<String>) -> ChannelDirectory {
        let mut webhooks = self.discord.webhooks.clone();
        for key in self
            .projects
            .iter()
            .filter_map(|p| p.notification_channel.as_deref())
        {
            if webhooks.contains_key(key) {
                continue;
            }
            if let Some(url) = non_empty(get_env(key)) {
                webhooks.insert(key.to_string(), url);
            }
        }
        ChannelDirectory::new(webhooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[server]
bind = "127.0.0.1:8080"

[github]
token = "ghp_file"

[bugherd]
api_key = "bh_file"

[discord.webhooks]
WEB_APP_CHANNEL = "https://discord.test/api/webhooks/web"

[[projects]]
bugherd_project_id = 464238
github_owner = "Acme"
github_repo = "web-app"
notification_channel = "WEB_APP_CHANNEL"
closed_column = "in review"

[[projects]]
bugherd_project_id = 500
github_owner = "Acme"
github_repo = "api"
notification_channel = "API_CHANNEL"
closed_column = "done"

[[developers]]
tag = "DEV Jane Doe"
github_username = "janedoe"
discord_id = "1001"
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_every_section() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.projects.len(), 2);
        assert_eq!(config.developers[0].discord_id.as_deref(), Some("1001"));

        let projects = config.project_directory();
        assert_eq!(
            projects.by_repo("Acme", "api").map(|p| p.closed_column.as_str()),
            Some("done")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.projects.is_empty());
        assert_eq!(config.bind_addr(), DEFAULT_BIND);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let file = write_config("[[projects]]\nbugherd_project_id = \"nope\"");
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn environment_overrides_file_secrets() {
        let file = write_config(SAMPLE);
        let mut config = load_config_from(file.path()).unwrap();
        config.apply_env(env(&[
            ("GITHUB_TOKEN", "ghp_env"),
            ("GITHUB_WEBHOOK_SECRET", "shh"),
            ("BUGHERD_API_KEY", ""),
        ]));
        let secrets = config.secrets().unwrap();
        assert_eq!(secrets.github_token, "ghp_env");
        assert_eq!(secrets.webhook_secret, "shh");
        // Blank values do not clobber the file.
        assert_eq!(secrets.bugherd_api_key, "bh_file");
    }

    #[test]
    fn missing_secret_is_named() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();
        let err = config.secrets().unwrap_err();
        assert!(err.to_string().contains("GITHUB_WEBHOOK_SECRET"));
    }

    #[test]
    fn channel_keys_fall_back_to_environment() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();
        let channels = config.channel_directory(env(&[
            ("WEB_APP_CHANNEL", "https://discord.test/ignored"),
            ("API_CHANNEL", "https://discord.test/api/webhooks/api"),
        ]));
        assert_eq!(
            channels.webhook_url(Some("WEB_APP_CHANNEL")),
            Some("https://discord.test/api/webhooks/web")
        );
        assert_eq!(
            channels.webhook_url(Some("API_CHANNEL")),
            Some("https://discord.test/api/webhooks/api")
        );

        let unresolved = config.channel_directory(env(&[]));
        assert_eq!(unresolved.webhook_url(Some("API_CHANNEL")), None);
    }
}
