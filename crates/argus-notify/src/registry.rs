//! Registry of configured notification channels.

use crate::NotificationChannel;
use argus_common::types::{ChannelType, Severity};
use std::collections::HashMap;
use std::sync::Arc;

/// A configured channel: implementation plus routing constraints. The
/// enabled flag and severity filter are fixed at construction;
/// reconfiguration means rebuilding the registry, not mutating entries.
pub struct ChannelEntry {
    pub enabled: bool,
    pub severity_filter: Vec<Severity>,
    channel: Arc<dyn NotificationChannel>,
}

impl ChannelEntry {
    pub fn accepts(&self, severity: Severity) -> bool {
        self.enabled && self.severity_filter.contains(&severity)
    }
}

/// Channels keyed by type. The dashboard channel is expected to always be
/// present with the full severity filter; the engine registers it
/// unconditionally at startup.
#[derive(Default)]
pub struct ChannelRegistry {
    entries: HashMap<ChannelType, ChannelEntry>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        channel: Arc<dyn NotificationChannel>,
        enabled: bool,
        severity_filter: Vec<Severity>,
    ) {
        let channel_type = channel.channel_type();
        tracing::info!(
            channel = %channel_type,
            enabled,
            "Notification channel registered"
        );
        self.entries.insert(
            channel_type,
            ChannelEntry {
                enabled,
                severity_filter,
                channel,
            },
        );
    }

    pub fn get(&self, channel_type: ChannelType) -> Option<&ChannelEntry> {
        self.entries.get(&channel_type)
    }

    /// The channel implementation, only when the entry is enabled and its
    /// filter admits the severity.
    pub fn resolve(
        &self,
        channel_type: ChannelType,
        severity: Severity,
    ) -> Option<Arc<dyn NotificationChannel>> {
        let entry = self.entries.get(&channel_type)?;
        if !entry.accepts(severity) {
            return None;
        }
        Some(entry.channel.clone())
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
