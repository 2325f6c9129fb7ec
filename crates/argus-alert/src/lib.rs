//! Detection core of the alerting engine.
//!
//! Source collectors produce candidate [`Alert`]s each scheduler tick, the
//! [`engine::AlertEngine`] admits them through deduplication and hourly
//! rate limiting, and the [`lifecycle::LifecycleManager`] drives the
//! active → acknowledged → resolved state machine. Statistical anomaly
//! detection lives in [`anomaly`]; static warning/critical bounds in
//! [`thresholds`].

pub mod anomaly;
pub mod engine;
pub mod lifecycle;
pub mod limiter;
pub mod pattern;
pub mod sources;
pub mod thresholds;

#[cfg(test)]
mod tests;

use anyhow::Result;
use argus_common::types::Alert;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A source collector: produces zero or more candidate alerts for one
/// scheduler tick given read access to its data source.
///
/// Collectors are independent and individually failure-isolated — the
/// pipeline logs a failing collector and proceeds with the others.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Stable identifier used as the alert `source` field and in logs.
    fn name(&self) -> &'static str;

    /// Evaluates the data source as of `now` and returns candidate alerts.
    ///
    /// Insufficient data is not an error: collectors return an empty list
    /// when there is nothing to report.
    async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<Alert>>;
}
