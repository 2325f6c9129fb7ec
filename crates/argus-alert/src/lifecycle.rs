//! Alert lifecycle: acknowledge/resolve operations, the hourly cleanup
//! sweep with auto-resolution, and the escalation extension point.
//!
//! State machine per alert: Active → (Acknowledged) → Resolved.
//! Acknowledgement is orthogonal to resolution; resolution is terminal.

use crate::engine::AlertEngine;
use crate::thresholds::{ThresholdRegistry, ThresholdUpdate};
use anyhow::Result;
use argus_common::types::Alert;
use argus_storage::AlertStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Persistence writes are external I/O and must never hang the sweep.
const PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Handler for long-unacknowledged alerts. The default implementation does
/// nothing; hosts substitute a real policy (paging, re-notification)
/// without touching the pipeline.
#[async_trait]
pub trait EscalationPolicy: Send + Sync {
    async fn escalate(&self, overdue: &[Alert]) -> Result<()>;
}

pub struct NoopEscalation;

#[async_trait]
impl EscalationPolicy for NoopEscalation {
    async fn escalate(&self, overdue: &[Alert]) -> Result<()> {
        tracing::debug!(count = overdue.len(), "Escalation check (no-op policy)");
        Ok(())
    }
}

pub struct LifecycleManager {
    engine: Arc<Mutex<AlertEngine>>,
    thresholds: Arc<RwLock<ThresholdRegistry>>,
    store: Arc<dyn AlertStore>,
    escalation: Arc<dyn EscalationPolicy>,
    escalation_enabled: bool,
    escalation_timeout_mins: i64,
}

impl LifecycleManager {
    pub fn new(
        engine: Arc<Mutex<AlertEngine>>,
        thresholds: Arc<RwLock<ThresholdRegistry>>,
        store: Arc<dyn AlertStore>,
        escalation: Arc<dyn EscalationPolicy>,
        escalation_enabled: bool,
        escalation_timeout_mins: i64,
    ) -> Self {
        Self {
            engine,
            thresholds,
            store,
            escalation,
            escalation_enabled,
            escalation_timeout_mins,
        }
    }

    /// Marks an active alert acknowledged; false when the id is unknown.
    pub async fn acknowledge(&self, id: &str) -> bool {
        let updated = {
            let mut engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !engine.acknowledge(id) {
                return false;
            }
            engine.get(id).cloned()
        };

        if let Some(alert) = updated {
            self.persist(&alert).await;
        }
        true
    }

    /// Resolves an active alert and evicts it from the active set; false
    /// when the id is unknown. Persistence is best-effort.
    pub async fn resolve(&self, id: &str) -> bool {
        let resolved = {
            let mut engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine.resolve(id)
        };

        match resolved {
            Some(alert) => {
                tracing::info!(id = %alert.id, "Alert resolved");
                self.persist(&alert).await;
                true
            }
            None => false,
        }
    }

    /// Hourly sweep: auto-resolves eligible alerts past their timeout and
    /// defensively purges anything already marked resolved.
    pub async fn cleanup(&self, now: DateTime<Utc>) {
        let due: Vec<String> = {
            let engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let registry = self
                .thresholds
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine
                .active_alerts()
                .into_iter()
                .filter(|a| {
                    a.auto_resolve
                        && a.age_minutes(now) >= registry.auto_resolve_timeout(a.metric.as_deref())
                })
                .map(|a| a.id)
                .collect()
        };

        let mut auto_resolved = Vec::new();
        {
            let mut engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for id in &due {
                if let Some(alert) = engine.resolve(id) {
                    auto_resolved.push(alert);
                }
            }
        }
        for alert in &auto_resolved {
            self.persist(alert).await;
        }

        let purged = {
            let mut engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine.purge_resolved(now)
        };

        tracing::info!(
            auto_resolved = auto_resolved.len(),
            purged,
            "Lifecycle cleanup completed"
        );
    }

    /// Hands unacknowledged alerts older than the escalation timeout to
    /// the configured policy.
    pub async fn escalation_check(&self, now: DateTime<Utc>) {
        if !self.escalation_enabled {
            return;
        }

        let overdue: Vec<Alert> = {
            let engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine
                .active_alerts()
                .into_iter()
                .filter(|a| !a.acknowledged && a.age_minutes(now) >= self.escalation_timeout_mins)
                .collect()
        };

        if overdue.is_empty() {
            return;
        }
        if let Err(e) = self.escalation.escalate(&overdue).await {
            tracing::error!(error = %e, "Escalation policy failed");
        }
    }

    /// Merges a partial update into an existing threshold; unknown metrics
    /// are a no-op by design.
    pub fn update_threshold(&self, metric: &str, update: ThresholdUpdate) -> bool {
        let mut registry = self
            .thresholds
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.update(metric, update)
    }

    async fn persist(&self, alert: &Alert) {
        match tokio::time::timeout(PERSIST_TIMEOUT, self.store.upsert(alert)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(id = %alert.id, error = %e, "Failed to persist alert");
            }
            Err(_) => {
                tracing::error!(id = %alert.id, "Alert persistence timed out");
            }
        }
    }
}
