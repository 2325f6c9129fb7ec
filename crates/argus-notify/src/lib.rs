//! Notification delivery with pluggable channel support.
//!
//! Alerts carry a channel-set snapshot computed from severity at creation;
//! the [`dispatcher::NotificationDispatcher`] resolves each snapshot entry
//! against the [`registry::ChannelRegistry`] (enabled flag + severity
//! filter) and fans out best-effort. Built-in channels: dashboard, email
//! (SMTP), slack, telegram, and generic webhook.

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod registry;

#[cfg(test)]
mod tests;

use anyhow::Result;
use argus_common::types::{Alert, ChannelType};
use async_trait::async_trait;

/// A notification delivery channel.
///
/// Implementations are registered in the [`registry::ChannelRegistry`] and
/// invoked by the dispatcher. A failed send is logged and never affects
/// sibling channels or alert acceptance.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the alert through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, alert: &Alert) -> Result<()>;

    /// The channel identifier this implementation serves.
    fn channel_type(&self) -> ChannelType;
}
