//! Workflow collector: failure rate over the last hour of executions.

use crate::sources::new_alert;
use crate::AlertSource;
use anyhow::Result;
use argus_common::types::{Alert, AlertType, MetricCategory, Severity};
use argus_storage::MetricSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Failure-rate percentage above which an alert is raised.
const FAILURE_RATE_THRESHOLD: f64 = 10.0;
/// Above this the alert escalates to critical.
const FAILURE_RATE_CRITICAL: f64 = 30.0;

pub struct WorkflowSource {
    source: Arc<dyn MetricSource>,
}

impl WorkflowSource {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl AlertSource for WorkflowSource {
    fn name(&self) -> &'static str {
        "workflow_monitor"
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let from = now - Duration::hours(1);
        let rows = self
            .source
            .query(MetricCategory::Workflow, from, now)
            .await?;

        let total = rows.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let failed = rows
            .iter()
            .filter(|r| r.value("failed").unwrap_or(0.0) >= 1.0)
            .count();
        let failure_rate = (failed as f64 / total as f64) * 100.0;

        if failure_rate <= FAILURE_RATE_THRESHOLD {
            return Ok(Vec::new());
        }

        let severity = if failure_rate > FAILURE_RATE_CRITICAL {
            Severity::Critical
        } else {
            Severity::High
        };

        let mut alert = new_alert(
            AlertType::Workflow,
            severity,
            self.name(),
            "workflow_failures",
            "Workflow failure rate elevated".to_string(),
            format!(
                "{failed} of {total} workflow executions failed in the last hour ({failure_rate:.1}%)"
            ),
            now,
        );
        alert.current_value = Some(failure_rate);
        alert.threshold_value = Some(FAILURE_RATE_THRESHOLD);
        alert.auto_resolve = false;
        alert.suggested_actions = vec![
            "Inspect the most recent failed executions".to_string(),
            "Check credentials and external endpoints used by failing workflows".to_string(),
        ];
        alert
            .metadata
            .insert("failed".into(), serde_json::json!(failed));
        alert
            .metadata
            .insert("total".into(), serde_json::json!(total));

        Ok(vec![alert])
    }
}
