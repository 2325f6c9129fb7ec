use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use argus_common::types::Severity;
///
/// let sev: Severity = "high".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "high");
/// assert!(Severity::Critical > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Alert category, matching the source collector that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Performance,
    Business,
    Security,
    Anomaly,
    Forecast,
    Workflow,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Performance => write!(f, "performance"),
            AlertType::Business => write!(f, "business"),
            AlertType::Security => write!(f, "security"),
            AlertType::Anomaly => write!(f, "anomaly"),
            AlertType::Forecast => write!(f, "forecast"),
            AlertType::Workflow => write!(f, "workflow"),
        }
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "performance" => Ok(AlertType::Performance),
            "business" => Ok(AlertType::Business),
            "security" => Ok(AlertType::Security),
            "anomaly" => Ok(AlertType::Anomaly),
            "forecast" => Ok(AlertType::Forecast),
            "workflow" => Ok(AlertType::Workflow),
            _ => Err(format!("unknown alert type: {s}")),
        }
    }
}

/// Notification delivery channel identifier.
///
/// The dashboard channel is always registered and accepts every severity;
/// the others are enabled by configuration presence at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Email,
    Slack,
    Telegram,
    Webhook,
    Dashboard,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Slack => write!(f, "slack"),
            ChannelType::Telegram => write!(f, "telegram"),
            ChannelType::Webhook => write!(f, "webhook"),
            ChannelType::Dashboard => write!(f, "dashboard"),
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(ChannelType::Email),
            "slack" => Ok(ChannelType::Slack),
            "telegram" => Ok(ChannelType::Telegram),
            "webhook" => Ok(ChannelType::Webhook),
            "dashboard" => Ok(ChannelType::Dashboard),
            _ => Err(format!("unknown channel type: {s}")),
        }
    }
}

/// Default channel set for a severity, captured into the alert at creation.
///
/// The snapshot is authoritative for the alert's lifetime: later channel
/// reconfiguration never rewrites the routing of alerts already raised.
pub fn default_channels(severity: Severity) -> Vec<ChannelType> {
    match severity {
        Severity::Critical => vec![
            ChannelType::Dashboard,
            ChannelType::Email,
            ChannelType::Slack,
            ChannelType::Telegram,
        ],
        Severity::High => vec![ChannelType::Dashboard, ChannelType::Email, ChannelType::Slack],
        Severity::Medium => vec![ChannelType::Dashboard, ChannelType::Email],
        Severity::Low => vec![ChannelType::Dashboard],
    }
}

/// A single notify-worthy event produced by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Identifier of the collector that raised the alert.
    pub source: String,
    pub metric: Option<String>,
    pub current_value: Option<f64>,
    pub expected_value: Option<f64>,
    pub threshold_value: Option<f64>,
    /// Heuristic confidence in [0, 1]; 1.0 for plain threshold breaches.
    pub confidence: f64,
    pub acknowledged: bool,
    pub resolved: bool,
    pub auto_resolve: bool,
    pub suggested_actions: Vec<String>,
    pub related_alerts: Vec<String>,
    /// Channel set snapshot computed from severity at creation time.
    pub channels: Vec<ChannelType>,
    /// Detector-specific diagnostics (z-score, sample size, ...).
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Age of the alert at `now`, in whole minutes.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_minutes()
    }

    /// Key used for dedup/rate-limit bookkeeping when the alert carries no
    /// metric name.
    pub fn metric_key(&self) -> &str {
        self.metric.as_deref().unwrap_or(&self.source)
    }
}

/// Category of raw data pulled from a metric source, one per collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Realtime,
    Performance,
    Business,
    Workflow,
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricCategory::Realtime => write!(f, "realtime"),
            MetricCategory::Performance => write!(f, "performance"),
            MetricCategory::Business => write!(f, "business"),
            MetricCategory::Workflow => write!(f, "workflow"),
        }
    }
}

/// One observation row from a metric source: a timestamp plus numeric
/// fields addressable by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub timestamp: DateTime<Utc>,
    pub values: HashMap<String, f64>,
}

impl MetricRow {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// Aggregate counts over the active set and alert history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertStats {
    pub total: u64,
    pub by_severity: HashMap<String, u64>,
    pub by_type: HashMap<String, u64>,
    pub acknowledged_count: u64,
    pub resolved_count: u64,
}
