//! Built-in source collectors, one per alert category.

pub mod business;
pub mod performance;
pub mod realtime;
pub mod workflow;

use argus_common::id::alert_id;
use argus_common::types::{default_channels, Alert, AlertType, Severity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Builds an alert skeleton with the id and channel snapshot derived from
/// category, metric, and severity; collectors fill in the quantitative
/// fields afterwards.
pub(crate) fn new_alert(
    alert_type: AlertType,
    severity: Severity,
    source: &str,
    metric: &str,
    title: String,
    message: String,
    now: DateTime<Utc>,
) -> Alert {
    Alert {
        id: alert_id(alert_type, metric, now),
        alert_type,
        severity,
        title,
        message,
        source: source.to_string(),
        metric: Some(metric.to_string()),
        current_value: None,
        expected_value: None,
        threshold_value: None,
        confidence: 1.0,
        acknowledged: false,
        resolved: false,
        auto_resolve: true,
        suggested_actions: Vec::new(),
        related_alerts: Vec::new(),
        channels: default_channels(severity),
        metadata: HashMap::new(),
        created_at: now,
    }
}

/// Mean of the named field over rows that carry it; `None` when no row
/// does.
pub(crate) fn field_mean(rows: &[argus_common::types::MetricRow], field: &str) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.value(field)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
