//! Built-in channel implementations.

pub mod dashboard;
pub mod email;
pub mod slack;
pub mod telegram;
pub mod webhook;

use anyhow::Result;
use argus_common::types::Alert;
use serde_json::Value;

/// Plain-text summary shared by the text-oriented channels.
pub(crate) fn format_summary(alert: &Alert) -> String {
    let mut lines = vec![
        format!("Alert: {} [{}]", alert.title, alert.severity),
        format!("Type: {}", alert.alert_type),
        format!("Source: {}", alert.source),
    ];
    if let Some(metric) = &alert.metric {
        lines.push(format!("Metric: {metric}"));
    }
    if let Some(value) = alert.current_value {
        lines.push(format!("Value: {value:.2}"));
    }
    if let Some(threshold) = alert.threshold_value {
        lines.push(format!("Threshold: {threshold:.2}"));
    }
    lines.push(format!("Message: {}", alert.message));
    lines.push(format!("Time: {}", alert.created_at.to_rfc3339()));
    lines.join("\n")
}

/// POSTs a JSON payload with up to three attempts and exponential backoff,
/// returning the response body on HTTP success.
pub(crate) async fn post_with_retry(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    payload: &Value,
) -> Result<String> {
    let mut last_err = None;

    for attempt in 0..3u32 {
        match client.post(url).json(payload).send().await {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                if status.is_success() {
                    return Ok(body);
                }
                tracing::warn!(
                    service,
                    attempt = attempt + 1,
                    status = %status,
                    "Notification endpoint returned non-success status, retrying"
                );
                last_err = Some(anyhow::anyhow!("HTTP {status}: {body}"));
            }
            Err(e) => {
                tracing::warn!(
                    service,
                    attempt = attempt + 1,
                    error = %e,
                    "Notification request failed, retrying"
                );
                last_err = Some(e.into());
            }
        }
        if attempt < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(100 * 2u64.pow(attempt))).await;
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{service}: send failed")))
}
