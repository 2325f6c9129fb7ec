//! Generic webhook channel: POSTs the alert as JSON to a configured URL.

use crate::channels::post_with_retry;
use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{Alert, ChannelType};
use async_trait::async_trait;
use serde_json::json;

pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let payload = json!({
            "alert_id": alert.id,
            "type": alert.alert_type.to_string(),
            "severity": alert.severity.to_string(),
            "title": alert.title,
            "message": alert.message,
            "source": alert.source,
            "metric": alert.metric,
            "current_value": alert.current_value,
            "threshold_value": alert.threshold_value,
            "confidence": alert.confidence,
            "metadata": alert.metadata,
            "created_at": alert.created_at.to_rfc3339(),
        });
        post_with_retry(&self.client, "webhook", &self.url, &payload).await?;
        Ok(())
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Webhook
    }
}
