//! Performance collector: aggregate response time and error rate over the
//! last hour, compared against static thresholds.

use crate::sources::{field_mean, new_alert};
use crate::thresholds::ThresholdRegistry;
use crate::AlertSource;
use anyhow::Result;
use argus_common::types::{Alert, AlertType, MetricCategory};
use argus_storage::MetricSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};

/// Cap on samples considered per tick; the newest rows win.
const MAX_SAMPLES: usize = 1000;

pub struct PerformanceSource {
    source: Arc<dyn MetricSource>,
    thresholds: Arc<RwLock<ThresholdRegistry>>,
}

impl PerformanceSource {
    pub fn new(source: Arc<dyn MetricSource>, thresholds: Arc<RwLock<ThresholdRegistry>>) -> Self {
        Self { source, thresholds }
    }
}

#[async_trait]
impl AlertSource for PerformanceSource {
    fn name(&self) -> &'static str {
        "performance_monitor"
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let from = now - Duration::hours(1);
        let mut rows = self
            .source
            .query(MetricCategory::Performance, from, now)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if rows.len() > MAX_SAMPLES {
            rows.drain(..rows.len() - MAX_SAMPLES);
        }

        let avg_response = field_mean(&rows, "response_time");
        let error_count = rows
            .iter()
            .filter(|r| r.value("is_error").unwrap_or(0.0) >= 1.0)
            .count();
        let error_rate = (error_count as f64 / rows.len() as f64) * 100.0;

        let mut alerts = Vec::new();
        let registry = self
            .thresholds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(avg) = avg_response {
            if let Some(breach) = registry.classify("response_time", avg) {
                let mut alert = new_alert(
                    AlertType::Performance,
                    breach.severity,
                    self.name(),
                    "response_time",
                    "Elevated API response time".to_string(),
                    format!(
                        "Average response time {avg:.0}ms over the last hour exceeds {bound:.0}ms",
                        bound = breach.bound,
                    ),
                    now,
                );
                alert.current_value = Some(avg);
                alert.threshold_value = Some(breach.bound);
                alert.suggested_actions = vec![
                    "Check upstream service latency and database slow queries".to_string(),
                    "Review recent deployments".to_string(),
                ];
                alert
                    .metadata
                    .insert("sample_count".into(), serde_json::json!(rows.len()));
                alerts.push(alert);
            }
        }

        if let Some(breach) = registry.classify("error_rate", error_rate) {
            let mut alert = new_alert(
                AlertType::Performance,
                breach.severity,
                self.name(),
                "error_rate",
                "Elevated error rate".to_string(),
                format!(
                    "{error_rate:.1}% of responses failed over the last hour (threshold {bound:.1}%)",
                    bound = breach.bound,
                ),
                now,
            );
            alert.current_value = Some(error_rate);
            alert.threshold_value = Some(breach.bound);
            alert.suggested_actions = vec![
                "Inspect error logs for the dominant failure class".to_string(),
                "Verify downstream dependencies are healthy".to_string(),
            ];
            alert
                .metadata
                .insert("error_count".into(), serde_json::json!(error_count));
            alert
                .metadata
                .insert("sample_count".into(), serde_json::json!(rows.len()));
            alerts.push(alert);
        }

        Ok(alerts)
    }
}
