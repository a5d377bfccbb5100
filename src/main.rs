mod cli;
mod config;
mod error;
mod mapping;
mod model;
mod providers;
mod server;
mod signature;
mod sync;
mod templates;
mod util;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::AppConfig;
use providers::bugherd::BugherdClient;
use providers::discord::DiscordClient;
use providers::github::GitHubClient;
use server::AppState;
use sync::SyncContext;
use templates::notification::RandomCelebration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = cli::parse_args(&args)?;
    if command == Command::Help {
        cli::print_help();
        return Ok(());
    }

    let config = config::load_config()?;
    match command {
        Command::Serve => serve(&config).await,
        Command::SetupGithub { public_url } => cli::setup_github(&config, &public_url).await,
        Command::SetupBugherd { public_url } => cli::setup_bugherd(&config, &public_url).await,
        Command::Help => Ok(()),
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    let secrets = config.secrets()?;
    if config.projects.is_empty() {
        info!("No projects configured; every delivery will be ignored");
    }

    let sync = SyncContext {
        issues: Arc::new(GitHubClient::new(secrets.github_token)),
        tasks: Arc::new(BugherdClient::new(&secrets.bugherd_api_key)),
        notifier: Arc::new(DiscordClient::new()),
        projects: config.project_directory(),
        developers: config.developer_directory(),
        channels: config.channel_directory(|key| std::env::var(key).ok()),
        celebrations: Arc::new(RandomCelebration),
    };
    let state = Arc::new(AppState {
        sync: Arc::new(sync),
        webhook_secret: secrets.webhook_secret,
    });

    server::run_server(config.bind_addr(), state).await
}
