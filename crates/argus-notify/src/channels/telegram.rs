//! Telegram channel via the Bot API `sendMessage` call.

use crate::channels::post_with_retry;
use crate::error::NotifyError;
use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{Alert, ChannelType};
use async_trait::async_trait;
use serde_json::json;

pub struct TelegramChannel {
    client: reqwest::Client,
    api_url: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "telegram channel requires bot_token and chat_id".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
            chat_id: chat_id.to_string(),
        })
    }

    fn format_text(alert: &Alert) -> String {
        let mut text = format!(
            "*{title}* `{severity}`\n{message}",
            title = alert.title,
            severity = alert.severity,
            message = alert.message,
        );
        if let (Some(value), Some(metric)) = (alert.current_value, &alert.metric) {
            text.push_str(&format!("\n{metric}: {value:.2}"));
        }
        text
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": Self::format_text(alert),
            "parse_mode": "Markdown",
        });

        let body = post_with_retry(&self.client, "telegram", &self.api_url, &payload).await?;

        // The Bot API reports failures inside a 200 response.
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        if parsed.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let detail = parsed
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(NotifyError::Api {
                service: "telegram".to_string(),
                detail,
            }
            .into());
        }
        Ok(())
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Telegram
    }
}
