//! Business collector: current-day revenue and conversion rate against
//! their low-side thresholds. Business alerts always require human
//! resolution.

use crate::sources::{field_mean, new_alert};
use crate::thresholds::ThresholdRegistry;
use crate::AlertSource;
use anyhow::Result;
use argus_common::types::{Alert, AlertType, MetricCategory};
use argus_storage::MetricSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

pub struct BusinessSource {
    source: Arc<dyn MetricSource>,
    thresholds: Arc<RwLock<ThresholdRegistry>>,
}

impl BusinessSource {
    pub fn new(source: Arc<dyn MetricSource>, thresholds: Arc<RwLock<ThresholdRegistry>>) -> Self {
        Self { source, thresholds }
    }
}

#[async_trait]
impl AlertSource for BusinessSource {
    fn name(&self) -> &'static str {
        "business_monitor"
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        let rows = self
            .source
            .query(MetricCategory::Business, day_start, now)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let revenue_total: f64 = rows.iter().filter_map(|r| r.value("revenue")).sum();
        let conversion_avg = field_mean(&rows, "conversion_rate");

        let mut alerts = Vec::new();
        let registry = self
            .thresholds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(breach) = registry.classify("revenue", revenue_total) {
            let mut alert = new_alert(
                AlertType::Business,
                breach.severity,
                self.name(),
                "revenue",
                "Daily revenue below target".to_string(),
                format!(
                    "Revenue for today is {revenue_total:.2}, below the {bound:.2} floor",
                    bound = breach.bound,
                ),
                now,
            );
            alert.current_value = Some(revenue_total);
            alert.threshold_value = Some(breach.bound);
            alert.auto_resolve = false;
            alert.suggested_actions = vec![
                "Check payment provider status".to_string(),
                "Review active campaigns and pricing changes".to_string(),
            ];
            alerts.push(alert);
        }

        if let Some(avg) = conversion_avg {
            if let Some(breach) = registry.classify("conversion_rate", avg) {
                let mut alert = new_alert(
                    AlertType::Business,
                    breach.severity,
                    self.name(),
                    "conversion_rate",
                    "Conversion rate below target".to_string(),
                    format!(
                        "Average conversion rate today is {avg:.2}%, below the {bound:.2}% floor",
                        bound = breach.bound,
                    ),
                    now,
                );
                alert.current_value = Some(avg);
                alert.threshold_value = Some(breach.bound);
                alert.auto_resolve = false;
                alert.suggested_actions = vec![
                    "Verify the checkout funnel end to end".to_string(),
                    "Compare traffic quality against previous days".to_string(),
                ];
                alerts.push(alert);
            }
        }

        Ok(alerts)
    }
}
