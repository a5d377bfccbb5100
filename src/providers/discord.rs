use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::Notifier;
use crate::error::ApiError;
use crate::model::notification::Notification;

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const LINK_STYLE: u8 = 5;

pub struct DiscordClient {
    client: reqwest::Client,
}

impl DiscordClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DiscordClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DiscordClient {
    async fn send(&self, webhook_url: &str, notification: &Notification) -> Result<()> {
        let payload = DiscordPayload::from_notification(notification, Utc::now());

        debug!(title = %notification.title, "Sending Discord notification");

        let resp = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .context("Discord webhook request failed")?;

        if !resp.status().is_success() {
            return Err(ApiError::from_response("Discord", resp).await.into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct DiscordPayload {
    embeds: Vec<DiscordEmbed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<ActionRow>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    color: u32,
    fields: Vec<DiscordField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<DiscordImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordFooter>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct DiscordImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<Button>,
}

#[derive(Debug, Serialize)]
struct Button {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    label: String,
    url: String,
}

impl DiscordPayload {
    fn from_notification(notification: &Notification, at: DateTime<Utc>) -> Self {
        let embed = DiscordEmbed {
            title: notification.title.clone(),
            color: notification.color.rgb(),
            fields: notification
                .fields
                .iter()
                .map(|f| DiscordField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            image: notification
                .image_url
                .clone()
                .map(|url| DiscordImage { url }),
            footer: notification
                .footer
                .clone()
                .map(|text| DiscordFooter { text }),
            timestamp: at.to_rfc3339(),
        };

        let components = if notification.buttons.is_empty() {
            Vec::new()
        } else {
            vec![ActionRow {
                kind: ACTION_ROW,
                components: notification
                    .buttons
                    .iter()
                    .map(|b| Button {
                        kind: BUTTON,
                        style: LINK_STYLE,
                        label: b.label.clone(),
                        url: b.url.clone(),
                    })
                    .collect(),
            }]
        };

        Self {
            embeds: vec![embed],
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notification::{Color, LinkButton, NotificationField};

    fn notification() -> Notification {
        Notification {
            title: "🐛 New bug reported".into(),
            color: Color::Red,
            fields: vec![
                NotificationField::new("Title", "Broken"),
                NotificationField::inline("Priority", "critical"),
            ],
            image_url: Some("https://cdn.test/s.png".into()),
            footer: Some("BugHerd → GitHub".into()),
            buttons: vec![LinkButton::new("View on GitHub", "https://github.com/o/r/issues/1")],
        }
    }

    #[test]
    fn payload_shape_matches_discord_webhook_api() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(DiscordPayload::from_notification(&notification(), at)).unwrap();

        let embed = &json["embeds"][0];
        assert_eq!(embed["color"], 16711680);
        assert_eq!(embed["fields"][1]["inline"], true);
        assert_eq!(embed["image"]["url"], "https://cdn.test/s.png");
        assert_eq!(embed["footer"]["text"], "BugHerd → GitHub");
        assert_eq!(embed["timestamp"], "2026-01-02T03:04:05+00:00");

        let row = &json["components"][0];
        assert_eq!(row["type"], 1);
        assert_eq!(row["components"][0]["type"], 2);
        assert_eq!(row["components"][0]["style"], 5);
        assert_eq!(row["components"][0]["label"], "View on GitHub");
    }

    #[test]
    fn optional_parts_are_omitted() {
        let mut n = notification();
        n.image_url = None;
        n.footer = None;
        n.buttons.clear();
        let json = serde_json::to_value(DiscordPayload::from_notification(&n, Utc::now())).unwrap();
        assert!(json["embeds"][0].get("image").is_none());
        assert!(json["embeds"][0].get("footer").is_none());
        assert!(json.get("components").is_none());
    }
}
