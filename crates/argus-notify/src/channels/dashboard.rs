//! Dashboard channel: appends a row to the notification store for the UI
//! to read. Always registered, accepts every severity.

use crate::NotificationChannel;
use anyhow::Result;
use argus_common::types::{Alert, ChannelType};
use argus_storage::{NotificationRecord, NotificationStore};
use async_trait::async_trait;
use std::sync::Arc;

pub struct DashboardChannel {
    store: Arc<dyn NotificationStore>,
}

impl DashboardChannel {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationChannel for DashboardChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        self.store
            .insert(NotificationRecord {
                alert_id: alert.id.clone(),
                severity: alert.severity,
                title: alert.title.clone(),
                message: alert.message.clone(),
                created_at: alert.created_at,
            })
            .await
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Dashboard
    }
}
