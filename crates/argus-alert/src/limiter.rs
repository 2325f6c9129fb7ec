//! Hourly fixed-window rate limiting per `(alert type, metric)` key.

use argus_common::types::AlertType;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

type LimitKey = (AlertType, String);

struct Bucket {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Caps accepted alerts per key within a rolling hour. Distinct severities
/// for the same metric share one budget, so the limiter bounds
/// notification storms that slip past deduplication.
pub struct RateLimiter {
    max_per_hour: u32,
    buckets: HashMap<LimitKey, Bucket>,
}

impl RateLimiter {
    pub fn new(max_per_hour: u32) -> Self {
        Self {
            max_per_hour,
            buckets: HashMap::new(),
        }
    }

    /// Consumes one slot for the key, restarting the window when the
    /// previous one is older than an hour. Returns false when the budget
    /// is exhausted.
    pub fn try_acquire(&mut self, alert_type: AlertType, metric_key: &str, now: DateTime<Utc>) -> bool {
        let bucket = self
            .buckets
            .entry((alert_type, metric_key.to_string()))
            .or_insert(Bucket {
                window_start: now,
                count: 0,
            });

        if now - bucket.window_start > Duration::hours(1) {
            bucket.window_start = now;
            bucket.count = 0;
        }

        if bucket.count >= self.max_per_hour {
            return false;
        }
        bucket.count += 1;
        true
    }

    /// Drops window state older than an hour so stale keys do not
    /// accumulate across long uptimes.
    pub fn evict_stale(&mut self, now: DateTime<Utc>) {
        self.buckets
            .retain(|_, b| now - b.window_start <= Duration::hours(1));
    }
}
