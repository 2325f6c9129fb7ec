use crate::channels::dashboard::DashboardChannel;
use crate::channels::format_summary;
use crate::channels::slack::SlackChannel;
use crate::channels::telegram::TelegramChannel;
use crate::dispatcher::NotificationDispatcher;
use crate::registry::ChannelRegistry;
use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{default_channels, Alert, AlertType, ChannelType, Severity};
use argus_storage::memory::MemoryNotificationStore;
use argus_storage::NotificationStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn make_alert(severity: Severity) -> Alert {
    Alert {
        id: format!("anomaly-revenue-{}", Utc::now().timestamp()),
        alert_type: AlertType::Anomaly,
        severity,
        title: "Anomaly detected in revenue".into(),
        message: "revenue is 5000.00, 80.0 standard deviations from the 24h mean 1000.00".into(),
        source: "realtime_anomaly".into(),
        metric: Some("revenue".into()),
        current_value: Some(5000.0),
        expected_value: Some(1000.0),
        threshold_value: None,
        confidence: 0.95,
        acknowledged: false,
        resolved: false,
        auto_resolve: true,
        suggested_actions: vec![],
        related_alerts: vec![],
        channels: default_channels(severity),
        metadata: HashMap::new(),
        created_at: Utc::now(),
    }
}

struct RecordingChannel {
    kind: ChannelType,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        self.sent.lock().unwrap().push(alert.id.clone());
        Ok(())
    }

    fn channel_type(&self) -> ChannelType {
        self.kind
    }
}

struct FailingChannel {
    kind: ChannelType,
}

#[async_trait]
impl NotificationChannel for FailingChannel {
    async fn send(&self, _alert: &Alert) -> Result<()> {
        anyhow::bail!("transport unavailable")
    }

    fn channel_type(&self) -> ChannelType {
        self.kind
    }
}

fn recording(kind: ChannelType) -> (Arc<RecordingChannel>, Arc<Mutex<Vec<String>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    (
        Arc::new(RecordingChannel {
            kind,
            sent: sent.clone(),
        }),
        sent,
    )
}

#[tokio::test]
async fn critical_alert_reaches_all_enabled_channels() {
    let mut registry = ChannelRegistry::new();
    let mut logs = Vec::new();
    for kind in [
        ChannelType::Dashboard,
        ChannelType::Email,
        ChannelType::Slack,
        ChannelType::Telegram,
    ] {
        let (channel, sent) = recording(kind);
        registry.register(channel, true, Severity::ALL.to_vec());
        logs.push(sent);
    }

    let dispatcher = NotificationDispatcher::new(registry, 5);
    dispatcher.dispatch(&make_alert(Severity::Critical)).await;

    for sent in logs {
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn disabled_channel_never_receives() {
    let mut registry = ChannelRegistry::new();
    let (telegram, telegram_sent) = recording(ChannelType::Telegram);
    let (dashboard, dashboard_sent) = recording(ChannelType::Dashboard);
    registry.register(telegram, false, Severity::ALL.to_vec());
    registry.register(dashboard, true, Severity::ALL.to_vec());

    let dispatcher = NotificationDispatcher::new(registry, 5);
    dispatcher.dispatch(&make_alert(Severity::Critical)).await;

    assert!(telegram_sent.lock().unwrap().is_empty());
    assert_eq!(dashboard_sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn severity_filter_excludes_alert() {
    let mut registry = ChannelRegistry::new();
    let (email, email_sent) = recording(ChannelType::Email);
    // email only wants critical
    registry.register(email, true, vec![Severity::Critical]);

    let dispatcher = NotificationDispatcher::new(registry, 5);
    dispatcher.dispatch(&make_alert(Severity::Medium)).await;
    assert!(email_sent.lock().unwrap().is_empty());

    dispatcher.dispatch(&make_alert(Severity::Critical)).await;
    assert_eq!(email_sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn channel_failure_does_not_block_siblings() {
    let mut registry = ChannelRegistry::new();
    registry.register(
        Arc::new(FailingChannel {
            kind: ChannelType::Email,
        }),
        true,
        Severity::ALL.to_vec(),
    );
    let (slack, slack_sent) = recording(ChannelType::Slack);
    registry.register(slack, true, Severity::ALL.to_vec());

    let dispatcher = NotificationDispatcher::new(registry, 5);
    dispatcher.dispatch(&make_alert(Severity::High)).await;

    assert_eq!(slack_sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn snapshot_limits_routing_even_when_more_channels_enabled() {
    let mut registry = ChannelRegistry::new();
    let (email, email_sent) = recording(ChannelType::Email);
    let (dashboard, dashboard_sent) = recording(ChannelType::Dashboard);
    registry.register(email, true, Severity::ALL.to_vec());
    registry.register(dashboard, true, Severity::ALL.to_vec());

    // A low-severity alert snapshots only the dashboard channel; the
    // enabled email entry must not be consulted.
    let dispatcher = NotificationDispatcher::new(registry, 5);
    dispatcher.dispatch(&make_alert(Severity::Low)).await;

    assert!(email_sent.lock().unwrap().is_empty());
    assert_eq!(dashboard_sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn dashboard_channel_writes_notification_row() {
    let store = Arc::new(MemoryNotificationStore::new());
    let channel = DashboardChannel::new(store.clone());
    let alert = make_alert(Severity::High);

    channel.send(&alert).await.unwrap();

    let recent = store.recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].alert_id, alert.id);
    assert_eq!(recent[0].severity, Severity::High);
}

#[test]
fn summary_contains_key_fields() {
    let alert = make_alert(Severity::Critical);
    let summary = format_summary(&alert);
    assert!(summary.contains("Anomaly detected in revenue"));
    assert!(summary.contains("critical"));
    assert!(summary.contains("Metric: revenue"));
    assert!(summary.contains("Value: 5000.00"));
}

#[test]
fn telegram_requires_token_and_chat_id() {
    assert!(TelegramChannel::new("", "42").is_err());
    assert!(TelegramChannel::new("123:abc", "").is_err());
    assert!(TelegramChannel::new("123:abc", "42").is_ok());
}

#[test]
fn slack_payload_reflects_severity() {
    let payload = SlackChannel::build_payload(&make_alert(Severity::Critical));
    assert_eq!(payload["attachments"][0]["color"], "#d32f2f");
    let text = payload["text"].as_str().unwrap();
    assert!(text.contains("Anomaly detected in revenue"));
}
