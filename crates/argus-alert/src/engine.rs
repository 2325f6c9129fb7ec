//! Alert admission: deduplication, rate limiting, and the active set.

use crate::limiter::RateLimiter;
use argus_common::types::{Alert, AlertStats};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

const HISTORY_CAPACITY: usize = 1000;

/// Admission policy knobs, a slice of the engine configuration.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    pub max_alerts_per_hour: u32,
    pub auto_acknowledge_duplicates: bool,
    /// When false the hourly per-key budget is not applied.
    pub rate_limiting: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_alerts_per_hour: 10,
            auto_acknowledge_duplicates: true,
            rate_limiting: true,
        }
    }
}

/// Owns the in-memory active-alert set and the admission bookkeeping.
///
/// All mutation happens through `&mut self`; callers serialize access by
/// sharing the engine behind a single mutex, which also keeps the
/// lifecycle sweep from racing an in-progress tick.
pub struct AlertEngine {
    config: AdmissionConfig,
    active: HashMap<String, Alert>,
    history: VecDeque<Alert>,
    limiter: RateLimiter,
    resolved_total: u64,
}

impl AlertEngine {
    pub fn new(config: AdmissionConfig) -> Self {
        let limiter = RateLimiter::new(config.max_alerts_per_hour);
        Self {
            config,
            active: HashMap::new(),
            history: VecDeque::new(),
            limiter,
            resolved_total: 0,
        }
    }

    /// Seeds the active set from persisted unresolved alerts at startup.
    pub fn warm(&mut self, alerts: Vec<Alert>) {
        let count = alerts.len();
        for alert in alerts {
            if !alert.resolved {
                self.active.insert(alert.id.clone(), alert);
            }
        }
        if count > 0 {
            tracing::info!(count, "Warmed active set from persisted alerts");
        }
    }

    /// Runs candidates through dedup then rate limiting, inserting
    /// survivors into the active set and history. Returns the accepted
    /// alerts for the caller to persist and dispatch.
    pub fn admit(&mut self, candidates: Vec<Alert>, now: DateTime<Utc>) -> Vec<Alert> {
        let mut accepted = Vec::new();

        for candidate in candidates {
            if let Some(existing_id) = self.find_duplicate(&candidate, now) {
                if self.config.auto_acknowledge_duplicates {
                    if let Some(existing) = self.active.get_mut(&existing_id) {
                        existing.acknowledged = true;
                    }
                }
                tracing::debug!(
                    id = %candidate.id,
                    duplicate_of = %existing_id,
                    "Candidate suppressed (duplicate of active alert)"
                );
                continue;
            }

            if self.config.rate_limiting
                && !self
                    .limiter
                    .try_acquire(candidate.alert_type, candidate.metric_key(), now)
            {
                tracing::warn!(
                    alert_type = %candidate.alert_type,
                    metric = candidate.metric_key(),
                    "Candidate dropped (hourly rate limit reached)"
                );
                continue;
            }

            self.active.insert(candidate.id.clone(), candidate.clone());
            self.push_history(candidate.clone());
            accepted.push(candidate);
        }

        accepted
    }

    /// An unresolved active alert with the same `(type, metric, severity)`
    /// tuple created within the last hour marks the candidate as the same
    /// ongoing incident.
    fn find_duplicate(&self, candidate: &Alert, now: DateTime<Utc>) -> Option<String> {
        self.active
            .values()
            .find(|a| {
                !a.resolved
                    && a.alert_type == candidate.alert_type
                    && a.metric_key() == candidate.metric_key()
                    && a.severity == candidate.severity
                    && now - a.created_at < Duration::hours(1)
            })
            .map(|a| a.id.clone())
    }

    fn push_history(&mut self, alert: Alert) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(alert);
    }

    /// Active alerts, most severe first, newest first within a severity.
    pub fn active_alerts(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.active.values().cloned().collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.created_at.cmp(&a.created_at))
        });
        alerts
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.active.get(id)
    }

    /// Recent accepted alerts, oldest first, at most `limit`.
    pub fn recent_history(&self, limit: usize) -> Vec<Alert> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Marks an active alert acknowledged. Resolution state is untouched.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        match self.active.get_mut(id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Marks an active alert resolved and removes it from the active set,
    /// returning the final record for persistence.
    pub fn resolve(&mut self, id: &str) -> Option<Alert> {
        let mut alert = self.active.remove(id)?;
        alert.resolved = true;
        self.resolved_total += 1;
        Some(alert)
    }

    /// Defensive sweep: purges entries already marked resolved (resolve()
    /// removes them eagerly, so a nonzero count indicates a bug upstream).
    /// Also evicts stale rate-limiter windows.
    pub fn purge_resolved(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.active.len();
        self.active.retain(|_, a| !a.resolved);
        self.limiter.evict_stale(now);
        before - self.active.len()
    }

    /// Counts over the active set plus the lifetime resolved counter.
    pub fn stats(&self) -> AlertStats {
        let mut stats = AlertStats {
            total: self.active.len() as u64 + self.resolved_total,
            resolved_count: self.resolved_total,
            ..Default::default()
        };
        for alert in self.active.values() {
            *stats
                .by_severity
                .entry(alert.severity.to_string())
                .or_insert(0) += 1;
            *stats
                .by_type
                .entry(alert.alert_type.to_string())
                .or_insert(0) += 1;
            if alert.acknowledged {
                stats.acknowledged_count += 1;
            }
        }
        stats
    }
}
