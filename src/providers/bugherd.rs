use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::BugTracker;
use crate::error::ApiError;
use crate::model::task::Task;

const API_BASE: &str = "https://www.bugherd.com/api_v2";
const SERVICE: &str = "BugHerd";

pub struct BugherdClient {
    auth_header: String,
    client: reqwest::Client,
}

impl BugherdClient {
    pub fn new(api_key: &str) -> Self {
        // BugHerd takes the API key as the user name with a dummy password.
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{api_key}:x"));
        Self {
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{API_BASE}{path}"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.send().await.context("BugHerd API request failed")?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(SERVICE, resp).await.into());
        }
        resp.json().await.context("Failed to parse BugHerd response")
    }

    async fn update_task(&self, project_id: u64, task_id: u64, update: TaskUpdate<'_>) -> Result<()> {
        let path = format!("/projects/{project_id}/tasks/{task_id}.json");
        let _: serde_json::Value = self
            .send(
                self.request(Method::PUT, &path)
                    .json(&json!({ "task": update })),
            )
            .await?;
        Ok(())
    }

    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>> {
        let resp: WebhookList = self.send(self.request(Method::GET, "/webhooks.json")).await?;
        Ok(resp.webhooks)
    }

    pub async fn create_webhook(&self, target_url: &str, event: &str) -> Result<Webhook> {
        let body = json!({ "target_url": target_url, "event": event });
        let resp: WebhookEnvelope = self
            .send(self.request(Method::POST, "/webhooks.json").json(&body))
            .await?;
        Ok(resp.webhook)
    }
}

#[derive(Serialize, Default)]
struct TaskUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct TaskList {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
pub struct Webhook {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    pub target_url: String,
    pub event: String,
}

#[derive(Deserialize)]
struct WebhookList {
    #[serde(default)]
    webhooks: Vec<Webhook>,
}

#[derive(Deserialize)]
struct WebhookEnvelope {
    webhook: Webhook,
}

#[async_trait]
impl BugTracker for BugherdClient {
    async fn find_task_by_external_id(
        &self,
        project_id: u64,
        external_id: &str,
    ) -> Result<Option<Task>> {
        let path = format!(
            "/projects/{project_id}/tasks.json?external_id={}",
            urlencoding::encode(external_id)
        );
        let resp = self
            .request(Method::GET, &path)
            .send()
            .await
            .context("BugHerd API request failed")?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ApiError::from_response(SERVICE, resp).await.into());
        }

        let list: TaskList = resp.json().await.context("Failed to parse BugHerd tasks")?;
        Ok(list.tasks.into_iter().next())
    }

    async fn set_task_external_id(&self, project_id: u64, task_id: u64, external_id: &str) -> Result<()> {
        self.update_task(
            project_id,
            task_id,
            TaskUpdate {
                external_id: Some(external_id),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to set external_id on BugHerd task {task_id}"))
    }

    async fn move_task_to_column(&self, project_id: u64, task_id: u64, column: &str) -> Result<()> {
        self.update_task(
            project_id,
            task_id,
            TaskUpdate {
                status: Some(column),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to move BugHerd task {task_id} to \"{column}\""))
    }

    async fn add_task_comment(&self, project_id: u64, task_id: u64, text: &str) -> Result<()> {
        let path = format!("/projects/{project_id}/tasks/{task_id}/comments.json");
        let _: serde_json::Value = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "comment": { "text": text } })),
            )
            .await
            .with_context(|| format!("Failed to comment on BugHerd task {task_id}"))?;
        Ok(())
    }
}
