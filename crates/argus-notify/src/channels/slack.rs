//! Slack channel via incoming webhook.

use crate::channels::post_with_retry;
use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{Alert, ChannelType, Severity};
use async_trait::async_trait;
use serde_json::json;

pub struct SlackChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackChannel {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }

    fn attachment_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "#d32f2f",
            Severity::High => "#f57c00",
            Severity::Medium => "#fbc02d",
            Severity::Low => "#78909c",
        }
    }

    pub(crate) fn build_payload(alert: &Alert) -> serde_json::Value {
        let mut fields = vec![
            json!({ "title": "Severity", "value": alert.severity.to_string(), "short": true }),
            json!({ "title": "Type", "value": alert.alert_type.to_string(), "short": true }),
        ];
        if let Some(metric) = &alert.metric {
            fields.push(json!({ "title": "Metric", "value": metric, "short": true }));
        }
        if let Some(value) = alert.current_value {
            fields.push(json!({
                "title": "Value",
                "value": format!("{value:.2}"),
                "short": true
            }));
        }

        json!({
            "text": format!(":rotating_light: {}", alert.title),
            "attachments": [{
                "color": Self::attachment_color(alert.severity),
                "text": alert.message,
                "fields": fields,
                "ts": alert.created_at.timestamp(),
            }],
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let payload = Self::build_payload(alert);
        post_with_retry(&self.client, "slack", &self.webhook_url, &payload).await?;
        Ok(())
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Slack
    }
}
