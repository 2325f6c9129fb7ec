use crate::types::AlertType;
use chrono::{DateTime, Utc};

/// Derives the alert id from category, metric key, and creation second.
///
/// The id is intentionally content-derived rather than random: two
/// evaluations of the same breach in the same second produce the same id,
/// so a re-run tick upserts instead of duplicating.
///
/// # Examples
///
/// ```
/// use argus_common::id::alert_id;
/// use argus_common::types::AlertType;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// assert_eq!(
///     alert_id(AlertType::Anomaly, "revenue", ts),
///     "anomaly-revenue-1700000000"
/// );
/// ```
pub fn alert_id(alert_type: AlertType, metric_key: &str, created_at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", alert_type, metric_key, created_at.timestamp())
}
