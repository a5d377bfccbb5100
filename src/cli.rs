use anyhow::{bail, Result};

use crate::config::AppConfig;
use crate::model::issue::RepoRef;
use crate::providers::bugherd::{BugherdClient, Webhook};
use crate::providers::github::{GitHubClient, RepoHook};
use crate::server::{BUGHERD_WEBHOOK_PATH, GITHUB_WEBHOOK_PATH};

/// BugHerd events the bridge subscribes to.
pub const BUGHERD_EVENTS: [&str; 2] = ["task_create", "task_update"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    SetupGithub { public_url: String },
    SetupBugherd { public_url: String },
    Help,
}

/// Parse the arguments after the program name.
///
/// Supported forms:
///   bugherd-sync
///   bugherd-sync serve
///   bugherd-sync setup-github https://bridge.example.com
///   bugherd-sync setup-bugherd https://bridge.example.com
///   bugherd-sync help
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Serve);
    };

    match command.as_str() {
        "serve" => {
            if !rest.is_empty() {
                bail!("serve takes no arguments");
            }
            Ok(Command::Serve)
        }
        "setup-github" => Ok(Command::SetupGithub {
            public_url: public_url(command, rest)?,
        }),
        "setup-bugherd" => Ok(Command::SetupBugherd {
            public_url: public_url(command, rest)?,
        }),
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => bail!("Unknown command '{other}'. Run `bugherd-sync help` for usage"),
    }
}

fn public_url(command: &str, rest: &[String]) -> Result<String> {
    let [url] = rest else {
        bail!("Usage: bugherd-sync {command} <public-url>");
    };
    if !url.starts_with("https://") && !url.starts_with("http://") {
        bail!("Public URL must start with http:// or https://, got '{url}'");
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn endpoint(public_url: &str, path: &str) -> String {
    format!("{public_url}{path}")
}

fn existing_hook<'a>(hooks: &'a [RepoHook], target: &str) -> Option<&'a RepoHook> {
    hooks
        .iter()
        .find(|hook| hook.config.url.as_deref() == Some(target))
}

/// Subscribed events that have no webhook pointing at `target` yet.
fn missing_events(webhooks: &[Webhook], target: &str) -> Vec<&'static str> {
    BUGHERD_EVENTS
        .into_iter()
        .filter(|event| {
            !webhooks
                .iter()
                .any(|hook| hook.target_url == target && hook.event == *event)
        })
        .collect()
}

/// Register the GitHub webhook on every configured repository.
pub async fn setup_github(config: &AppConfig, public_url: &str) -> Result<()> {
    if config.projects.is_empty() {
        bail!("No projects configured. Add [[projects]] entries to the config file");
    }
    let client = GitHubClient::new(config.github_token()?);
    let secret = config.webhook_secret()?;
    let target = endpoint(public_url, GITHUB_WEBHOOK_PATH);

    let mut failed = 0;
    for project in &config.projects {
        let repo = project.repo();
        if let Err(e) = ensure_github_hook(&client, &repo, &target, &secret).await {
            failed += 1;
            eprintln!("{repo}: {e:#}");
        }
    }

    if failed > 0 {
        bail!("Failed to set up {failed} of {} repositories", config.projects.len());
    }
    Ok(())
}

async fn ensure_github_hook(
    client: &GitHubClient,
    repo: &RepoRef,
    target: &str,
    secret: &str,
) -> Result<()> {
    let hooks = client.list_hooks(repo).await?;
    if let Some(hook) = existing_hook(&hooks, target) {
        println!(
            "{repo}: hook {} already delivers to {target} ({})",
            hook.id,
            hook.events.join(", ")
        );
        return Ok(());
    }
    let hook = client.create_hook(repo, target, secret).await?;
    println!("{repo}: created hook {} -> {target}", hook.id);
    Ok(())
}

/// Register the BugHerd task webhooks for the whole account.
pub async fn setup_bugherd(config: &AppConfig, public_url: &str) -> Result<()> {
    let client = BugherdClient::new(&config.bugherd_api_key()?);
    let target = endpoint(public_url, BUGHERD_WEBHOOK_PATH);

    let webhooks = client.list_webhooks().await?;
    for hook in webhooks.iter().filter(|h| h.target_url == target) {
        let scope = hook
            .project_id
            .map_or_else(|| "all projects".to_string(), |id| format!("project {id}"));
        println!("Existing webhook {}: {} for {scope}", hook.id, hook.event);
    }

    let missing = missing_events(&webhooks, &target);
    if missing.is_empty() {
        println!("BugHerd already delivers {} to {target}", BUGHERD_EVENTS.join(", "));
        return Ok(());
    }
    for event in missing {
        let hook = client.create_webhook(&target, event).await?;
        println!("Created webhook {}: {event} -> {target}", hook.id);
    }
    Ok(())
}

pub fn print_help() {
    println!("bugherd-sync — bridge BugHerd tasks, GitHub issues and Discord\n");
    println!("USAGE:");
    println!("  bugherd-sync                      Run the webhook server (same as `serve`)");
    println!("  bugherd-sync serve                Run the webhook server");
    println!("  bugherd-sync setup-github <url>   Register the GitHub webhook on every project repo");
    println!("  bugherd-sync setup-bugherd <url>  Register the BugHerd task webhooks");
    println!("  bugherd-sync help                 Show this message");
    println!();
    println!("CONFIG:");
    println!("  $BUGHERD_SYNC_CONFIG or ~/.bugherd-sync/config.toml");
    println!("  GITHUB_TOKEN, GITHUB_WEBHOOK_SECRET, BUGHERD_API_KEY and BIND_ADDR override the file");
    println!();
    println!("EXAMPLES:");
    println!("  bugherd-sync setup-github https://bugs.example.com");
    println!("  bugherd-sync setup-bugherd https://bugs.example.com");
}
