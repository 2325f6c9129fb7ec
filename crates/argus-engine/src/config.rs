//! Engine configuration: TOML file plus environment-derived channel
//! enablement. Malformed input falls back to the hard-coded defaults
//! rather than failing startup; the channel set is derived once here and
//! immutable afterwards.

use argus_alert::anomaly::AnomalyConfig;
use argus_alert::thresholds::AlertThreshold;
use argus_notify::channels::email::EmailConfig;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Pipeline tick interval.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// Lifecycle sweep interval.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Per-(type, metric) accepted-alert budget within a rolling hour.
    #[serde(default = "default_max_alerts_per_hour")]
    pub max_alerts_per_hour: u32,
    #[serde(default = "default_auto_acknowledge_duplicates")]
    pub auto_acknowledge_duplicates: bool,
    /// Upper bound on any single collector's query per tick.
    #[serde(default = "default_collect_timeout_secs")]
    pub collect_timeout_secs: u64,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Per-metric threshold overrides; invalid entries keep the default.
    #[serde(default)]
    pub thresholds: HashMap<String, AlertThreshold>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            update_interval_secs: default_update_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            max_alerts_per_hour: default_max_alerts_per_hour(),
            auto_acknowledge_duplicates: default_auto_acknowledge_duplicates(),
            collect_timeout_secs: default_collect_timeout_secs(),
            anomaly: AnomalyConfig::default(),
            notifications: NotificationSettings::default(),
            channels: ChannelsConfig::default(),
            thresholds: HashMap::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_update_interval_secs() -> u64 {
    30
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_max_alerts_per_hour() -> u32 {
    10
}

fn default_auto_acknowledge_duplicates() -> bool {
    true
}

fn default_collect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// When false the hourly per-key budget is not applied.
    #[serde(default = "default_rate_limiting")]
    pub rate_limiting: bool,
    /// Reserved toggle; the dispatcher currently sends per alert.
    #[serde(default)]
    pub batch_notifications: bool,
    #[serde(default)]
    pub escalation_enabled: bool,
    #[serde(default = "default_escalation_timeout_mins")]
    pub escalation_timeout_mins: i64,
    /// Upper bound on any single channel send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            rate_limiting: default_rate_limiting(),
            batch_notifications: false,
            escalation_enabled: false,
            escalation_timeout_mins: default_escalation_timeout_mins(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_rate_limiting() -> bool {
    true
}

fn default_escalation_timeout_mins() -> i64 {
    30
}

fn default_send_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

/// Per-channel delivery configuration; presence of a section enables the
/// channel. The dashboard channel needs no configuration and is always on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub slack: Option<SlackConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

impl ChannelsConfig {
    /// Derives channel configuration from environment presence:
    /// `ARGUS_SMTP_HOST`/`ARGUS_EMAIL_FROM`/`ARGUS_EMAIL_TO` (email),
    /// `ARGUS_SLACK_WEBHOOK_URL` (slack), `ARGUS_TELEGRAM_BOT_TOKEN` +
    /// `ARGUS_TELEGRAM_CHAT_ID` (telegram), `ARGUS_WEBHOOK_URL` (webhook).
    pub fn from_env() -> Self {
        let email = match (
            std::env::var("ARGUS_SMTP_HOST"),
            std::env::var("ARGUS_EMAIL_FROM"),
            std::env::var("ARGUS_EMAIL_TO"),
        ) {
            (Ok(smtp_host), Ok(from), Ok(to)) => Some(EmailConfig {
                smtp_host,
                smtp_port: std::env::var("ARGUS_SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                smtp_username: std::env::var("ARGUS_SMTP_USERNAME").ok(),
                smtp_password: std::env::var("ARGUS_SMTP_PASSWORD").ok(),
                from,
                to: to.split(',').map(|s| s.trim().to_string()).collect(),
            }),
            _ => None,
        };

        let slack = std::env::var("ARGUS_SLACK_WEBHOOK_URL")
            .ok()
            .map(|webhook_url| SlackConfig { webhook_url });

        let telegram = match (
            std::env::var("ARGUS_TELEGRAM_BOT_TOKEN"),
            std::env::var("ARGUS_TELEGRAM_CHAT_ID"),
        ) {
            (Ok(bot_token), Ok(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        let webhook = std::env::var("ARGUS_WEBHOOK_URL")
            .ok()
            .map(|url| WebhookConfig { url });

        Self {
            email,
            slack,
            telegram,
            webhook,
        }
    }

    /// File-configured channels win; the environment fills the gaps.
    pub fn with_env_fallback(mut self) -> Self {
        let env = Self::from_env();
        self.email = self.email.or(env.email);
        self.slack = self.slack.or(env.slack);
        self.telegram = self.telegram.or(env.telegram);
        self.webhook = self.webhook.or(env.webhook);
        self
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file. Any failure (missing file,
    /// parse error) is logged and answered with the defaults — invalid
    /// configuration must not prevent startup.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) => {
                tracing::warn!(path, error = %e, "Config file unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Self {
        match toml::from_str::<Self>(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Config parse failed, using defaults");
                Self::default()
            }
        }
    }
}
