//! In-memory implementations of the storage traits, used by the test suite
//! and by embeddings that do not need durable persistence.

use crate::{AlertStore, MetricSource, NotificationRecord, NotificationStore};
use anyhow::Result;
use argus_common::types::{Alert, MetricCategory, MetricRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Seedable metric source keyed by category.
#[derive(Default)]
pub struct MemoryMetricSource {
    rows: RwLock<HashMap<MetricCategory, Vec<MetricRow>>>,
}

impl MemoryMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, category: MetricCategory, row: MetricRow) {
        let mut rows = self.rows.write().await;
        rows.entry(category).or_default().push(row);
    }

    pub async fn push_all(&self, category: MetricCategory, batch: Vec<MetricRow>) {
        let mut rows = self.rows.write().await;
        rows.entry(category).or_default().extend(batch);
    }

    pub async fn clear(&self, category: MetricCategory) {
        self.rows.write().await.remove(&category);
    }
}

#[async_trait]
impl MetricSource for MemoryMetricSource {
    async fn query(
        &self,
        category: MetricCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricRow>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<MetricRow> = rows
            .get(&category)
            .map(|v| {
                v.iter()
                    .filter(|r| r.timestamp >= from && r.timestamp < to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matched.sort_by_key(|r| r.timestamp);
        Ok(matched)
    }
}

/// Alert store backed by a map keyed by alert id.
#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<HashMap<String, Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.read().await.get(id).cloned()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn upsert(&self, alert: &Alert) -> Result<()> {
        self.alerts
            .write()
            .await
            .insert(alert.id.clone(), alert.clone());
        Ok(())
    }

    async fn load_unresolved(&self) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        let mut unresolved: Vec<Alert> =
            alerts.values().filter(|a| !a.resolved).cloned().collect();
        unresolved.sort_by_key(|a| a.created_at);
        Ok(unresolved)
    }
}

/// Notification sink keeping records newest-first.
#[derive(Default)]
pub struct MemoryNotificationStore {
    records: RwLock<Vec<NotificationRecord>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, record: NotificationRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<NotificationRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
