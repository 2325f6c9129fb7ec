//! Best-effort fan-out of an accepted alert to its channel snapshot.

use crate::registry::ChannelRegistry;
use argus_common::types::Alert;
use std::time::Duration;

pub struct NotificationDispatcher {
    registry: ChannelRegistry,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(registry: ChannelRegistry, send_timeout_secs: u64) -> Self {
        Self {
            registry,
            send_timeout: Duration::from_secs(send_timeout_secs),
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Sends the alert to every channel in its snapshot that is enabled
    /// and whose severity filter admits it. Each send is bounded by the
    /// configured timeout; a failure is logged per channel and never
    /// blocks delivery to the others (at most one attempt per channel per
    /// alert).
    pub async fn dispatch(&self, alert: &Alert) {
        for channel_type in &alert.channels {
            let Some(channel) = self.registry.resolve(*channel_type, alert.severity) else {
                tracing::debug!(
                    channel = %channel_type,
                    id = %alert.id,
                    "Channel skipped (disabled, unregistered, or severity filtered)"
                );
                continue;
            };

            match tokio::time::timeout(self.send_timeout, channel.send(alert)).await {
                Ok(Ok(())) => {
                    tracing::debug!(channel = %channel_type, id = %alert.id, "Notification sent");
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        channel = %channel_type,
                        id = %alert.id,
                        error = %e,
                        "Failed to send notification"
                    );
                }
                Err(_) => {
                    tracing::error!(
                        channel = %channel_type,
                        id = %alert.id,
                        timeout_secs = self.send_timeout.as_secs(),
                        "Notification send timed out"
                    );
                }
            }
        }
    }
}
