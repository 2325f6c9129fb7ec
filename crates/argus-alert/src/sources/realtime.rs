//! Statistical collector: feeds 24 h of realtime metric series into the
//! anomaly detector.

use crate::anomaly::{detect, AnomalyConfig};
use crate::sources::new_alert;
use crate::AlertSource;
use anyhow::Result;
use argus_common::types::{Alert, AlertType, MetricCategory};
use argus_storage::MetricSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Metrics checked for statistical anomalies each tick.
pub const REALTIME_METRICS: [&str; 4] = ["revenue", "impressions", "clicks", "conversions"];

const LOOKBACK_HOURS: i64 = 24;

pub struct RealtimeAnomalySource {
    source: Arc<dyn MetricSource>,
    config: AnomalyConfig,
}

impl RealtimeAnomalySource {
    pub fn new(source: Arc<dyn MetricSource>, config: AnomalyConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl AlertSource for RealtimeAnomalySource {
    fn name(&self) -> &'static str {
        "realtime_anomaly"
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let from = now - Duration::hours(LOOKBACK_HOURS);
        let rows = self
            .source
            .query(MetricCategory::Realtime, from, now)
            .await?;

        let mut alerts = Vec::new();

        for metric in REALTIME_METRICS {
            let series: Vec<f64> = rows.iter().filter_map(|r| r.value(metric)).collect();

            let Some(verdict) = detect(metric, &series, &self.config) else {
                continue;
            };

            if verdict.confidence < self.config.confidence_threshold {
                tracing::debug!(
                    metric,
                    confidence = verdict.confidence,
                    threshold = self.config.confidence_threshold,
                    "Anomaly verdict below confidence threshold, dropped"
                );
                continue;
            }

            let mut alert = new_alert(
                AlertType::Anomaly,
                verdict.severity,
                self.name(),
                metric,
                format!("Anomaly detected in {metric}"),
                format!(
                    "{metric} is {current:.2}, {z:.1} standard deviations from the 24h mean {mean:.2}",
                    current = verdict.current,
                    z = verdict.z_score,
                    mean = verdict.mean,
                ),
                now,
            );
            alert.current_value = Some(verdict.current);
            alert.expected_value = Some(verdict.mean);
            alert.confidence = verdict.confidence;
            alert.suggested_actions = vec![
                format!("Inspect recent changes affecting {metric}"),
                "Compare against the same window on previous days".to_string(),
            ];
            alert
                .metadata
                .insert("z_score".into(), serde_json::json!(verdict.z_score));
            alert
                .metadata
                .insert("mean".into(), serde_json::json!(verdict.mean));
            alert
                .metadata
                .insert("std_dev".into(), serde_json::json!(verdict.std_dev));
            alert
                .metadata
                .insert("sample_size".into(), serde_json::json!(verdict.sample_size));

            tracing::info!(
                metric,
                severity = %alert.severity,
                z_score = verdict.z_score,
                "Statistical anomaly detected"
            );
            alerts.push(alert);
        }

        Ok(alerts)
    }
}
