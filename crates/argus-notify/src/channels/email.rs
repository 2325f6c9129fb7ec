//! Email channel over async SMTP.

use crate::channels::format_summary;
use crate::error::NotifyError;
use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{Alert, ChannelType};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: Vec<String>,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        if config.to.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "email channel has no recipients".to_string(),
            ));
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from.clone(),
            to: config.to.clone(),
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let subject = format!("[argus][{}] {}", alert.severity, alert.title);
        let body = format_summary(alert);

        let mut last_err = None;
        for recipient in &self.to {
            let email = Message::builder()
                .from(self.from.parse()?)
                .to(recipient.parse()?)
                .subject(&subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.clone())?;

            if let Err(e) = self.transport.send(email).await {
                tracing::error!(recipient = %recipient, error = %e, "Email send failed");
                last_err = Some(e);
            }
        }

        match last_err {
            Some(e) => Err(NotifyError::Smtp(e.to_string()).into()),
            None => Ok(()),
        }
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }
}
