//! Background scheduling: the pipeline tick and the lifecycle sweep.
//!
//! Both loops are sequential `interval` tasks, so a tick never overlaps
//! the previous one and admission always sees a consistent snapshot of the
//! active set. Collectors inside one tick run concurrently; each is
//! bounded by the collect timeout and individually failure-isolated.

use argus_alert::engine::AlertEngine;
use argus_alert::lifecycle::LifecycleManager;
use argus_alert::pattern::PatternLearner;
use argus_alert::AlertSource;
use argus_common::types::Alert;
use argus_notify::dispatcher::NotificationDispatcher;
use argus_storage::AlertStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

pub struct PipelineScheduler {
    sources: Vec<Arc<dyn AlertSource>>,
    engine: Arc<Mutex<AlertEngine>>,
    store: Arc<dyn AlertStore>,
    dispatcher: Arc<NotificationDispatcher>,
    learner: Arc<dyn PatternLearner>,
    lifecycle: Arc<LifecycleManager>,
    update_interval: Duration,
    cleanup_interval: Duration,
    collect_timeout: Duration,
}

impl PipelineScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sources: Vec<Arc<dyn AlertSource>>,
        engine: Arc<Mutex<AlertEngine>>,
        store: Arc<dyn AlertStore>,
        dispatcher: Arc<NotificationDispatcher>,
        learner: Arc<dyn PatternLearner>,
        lifecycle: Arc<LifecycleManager>,
        update_interval_secs: u64,
        cleanup_interval_secs: u64,
        collect_timeout_secs: u64,
    ) -> Self {
        Self {
            sources,
            engine,
            store,
            dispatcher,
            learner,
            lifecycle,
            update_interval: Duration::from_secs(update_interval_secs.max(1)),
            cleanup_interval: Duration::from_secs(cleanup_interval_secs.max(1)),
            collect_timeout: Duration::from_secs(collect_timeout_secs.max(1)),
        }
    }

    /// Pipeline loop. Ticks are strictly sequential: a slow tick delays
    /// the next instead of overlapping it.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.update_interval.as_secs(),
            sources = self.sources.len(),
            "Alert pipeline scheduler started"
        );
        let mut tick = interval(self.update_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            self.run_tick(Utc::now()).await;
        }
    }

    /// Lifecycle loop: cleanup sweep on the slower interval.
    pub async fn run_cleanup(&self) {
        tracing::info!(
            interval_secs = self.cleanup_interval.as_secs(),
            "Lifecycle sweep scheduler started"
        );
        let mut tick = interval(self.cleanup_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The immediate first tick would sweep an empty set; skip it.
        tick.tick().await;
        loop {
            tick.tick().await;
            self.lifecycle.cleanup(Utc::now()).await;
        }
    }

    /// One full pipeline pass: collect → dedup/rate-limit → persist +
    /// dispatch → pattern learning → escalation check.
    pub async fn run_tick(&self, now: DateTime<Utc>) {
        let candidates = self.collect_candidates(now).await;
        if !candidates.is_empty() {
            tracing::debug!(count = candidates.len(), "Collected candidate alerts");
        }

        let accepted = {
            let mut engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine.admit(candidates, now)
        };

        for alert in &accepted {
            tracing::info!(
                id = %alert.id,
                severity = %alert.severity,
                alert_type = %alert.alert_type,
                "Alert accepted"
            );
            // Write-through is best-effort: a failed or hung upsert leaves
            // the alert valid in the active set.
            match timeout(self.collect_timeout, self.store.upsert(alert)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(id = %alert.id, error = %e, "Failed to persist alert");
                }
                Err(_) => {
                    tracing::error!(id = %alert.id, "Alert persistence timed out");
                }
            }
            self.dispatcher.dispatch(alert).await;
        }

        let recent = {
            let engine = self
                .engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine.recent_history(100)
        };
        if let Err(e) = self.learner.observe(&recent).await {
            tracing::error!(error = %e, "Pattern learning pass failed");
        }

        self.lifecycle.escalation_check(now).await;
    }

    /// Runs every collector concurrently, bounded by the collect timeout.
    /// A failing or slow collector contributes nothing to this tick and
    /// never aborts the others.
    async fn collect_candidates(&self, now: DateTime<Utc>) -> Vec<Alert> {
        let results = join_all(self.sources.iter().map(|source| async move {
            let outcome = timeout(self.collect_timeout, source.collect(now)).await;
            (source.name(), outcome)
        }))
        .await;

        let mut candidates = Vec::new();
        for (name, outcome) in results {
            match outcome {
                Ok(Ok(alerts)) => candidates.extend(alerts),
                Ok(Err(e)) => {
                    tracing::error!(collector = name, error = %e, "Collector failed, skipping");
                }
                Err(_) => {
                    tracing::error!(
                        collector = name,
                        timeout_secs = self.collect_timeout.as_secs(),
                        "Collector timed out, skipping"
                    );
                }
            }
        }
        candidates
    }
}
