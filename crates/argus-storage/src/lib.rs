//! External-collaborator interfaces consumed by the alerting engine.
//!
//! The engine does not own a database: raw observations come in through
//! [`MetricSource`], accepted alerts are written through [`AlertStore`] as a
//! best-effort side channel, and the dashboard channel appends rows to a
//! [`NotificationStore`]. The in-memory implementations in [`memory`] back
//! the test suite and small embeddings.

pub mod memory;

use anyhow::Result;
use argus_common::types::{Alert, MetricCategory, MetricRow, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to a raw metric data source.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because collectors within one pipeline tick query concurrently. Rows are
/// returned in ascending timestamp order.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Queries observation rows for one category within `[from, to)`.
    async fn query(
        &self,
        category: MetricCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricRow>>;
}

/// Persistence backend for alert records.
///
/// Writes are best-effort: a failed upsert is logged by the caller and the
/// alert stays valid in the in-memory active set.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Inserts or replaces an alert row by id.
    async fn upsert(&self, alert: &Alert) -> Result<()>;

    /// Loads all unresolved alerts; called once at startup to warm the
    /// active set.
    async fn load_unresolved(&self) -> Result<Vec<Alert>>;
}

/// A row written by the dashboard notification channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationRecord {
    pub alert_id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Sink for dashboard notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, record: NotificationRecord) -> Result<()>;

    /// Most recent records, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<NotificationRecord>>;
}
