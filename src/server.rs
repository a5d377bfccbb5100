//! Inbound webhook endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::WebhookError;
use crate::model::issue::{IssuesWebhook, PullRequestWebhook};
use crate::model::task::TaskWebhook;
use crate::signature::{verify_signature, SIGNATURE_HEADER};
use crate::sync::closure::sync_issue_transition;
use crate::sync::pr_link::link_pull_request;
use crate::sync::{handle_task_webhook, Outcome, SkipReason, SyncContext};

pub const BUGHERD_WEBHOOK_PATH: &str = "/webhook/bugherd";
pub const GITHUB_WEBHOOK_PATH: &str = "/webhook/github";
pub const HEALTH_PATH: &str = "/health";

const EVENT_HEADER: &str = "x-github-event";

pub struct AppState {
    pub sync: Arc<SyncContext>,
    pub webhook_secret: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(handle_health))
        .route(BUGHERD_WEBHOOK_PATH, post(handle_bugherd))
        .route(GITHUB_WEBHOOK_PATH, post(handle_github))
        .with_state(state)
}

/// Binds `bind` and serves until Ctrl-C.
pub async fn run_server(bind: &str, state: Arc<AppState>) -> Result<()> {
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{bind}': expected host:port"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to resolve listen address")?;

    info!(
        addr = %local_addr,
        projects = state.sync.projects.all().len(),
        developers = state.sync.developers.len(),
        "Webhook server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Webhook server exited unexpectedly")?;
    Ok(())
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

async fn handle_bugherd(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let hook: TaskWebhook = parse(&body, "BugHerd")?;
    info!(
        event = hook.event.as_deref().unwrap_or("<inferred>"),
        task_id = hook.task.id,
        project_id = hook.task.project_id,
        "BugHerd webhook received"
    );
    let outcome = handle_task_webhook(&state.sync, &hook)
        .await
        .map_err(failed)?;
    respond(&outcome)
}

async fn handle_github(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let Some(signature) = header(&headers, SIGNATURE_HEADER) else {
        warn!("GitHub webhook without signature rejected");
        return Err(WebhookError::Unauthorized("Missing signature"));
    };
    if !verify_signature(&body, signature, &state.webhook_secret) {
        warn!("GitHub webhook with invalid signature rejected");
        return Err(WebhookError::Unauthorized("Invalid signature"));
    }

    let event = header(&headers, EVENT_HEADER).unwrap_or_default();
    info!(event = %event, "GitHub webhook received");

    let outcome = match event {
        "issues" => {
            let hook: IssuesWebhook = parse(&body, "issues")?;
            sync_issue_transition(&state.sync, &hook)
                .await
                .map_err(failed)?
        }
        "pull_request" => {
            let hook: PullRequestWebhook = parse(&body, "pull_request")?;
            link_pull_request(&state.sync, &hook).await.map_err(failed)?
        }
        _ => Outcome::ignored(SkipReason::UnhandledEvent),
    };
    respond(&outcome)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn parse<T: DeserializeOwned>(body: &[u8], kind: &str) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(kind, error = %e, "Malformed webhook payload");
        WebhookError::BadRequest(format!("Invalid {kind} payload: {e}"))
    })
}

fn failed(err: anyhow::Error) -> WebhookError {
    error!(error = %format!("{err:#}"), "Webhook processing failed");
    WebhookError::from(err)
}

/// `{"success": true, ...outcome}`.
fn respond(outcome: &Outcome) -> Result<Response, WebhookError> {
    let value = serde_json::to_value(outcome).context("Failed to serialize outcome")?;
    let Value::Object(mut body) = value else {
        return Err(anyhow!("Outcome did not serialize to an object").into());
    };
    body.insert("success".to_string(), Value::Bool(true));
    Ok((StatusCode::OK, Json(Value::Object(body))).into_response())
}
