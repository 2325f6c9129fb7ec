//! Static per-metric warning/critical bounds and their registry.

use argus_common::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback auto-resolve timeout for alerts whose metric has no registry
/// entry.
pub const DEFAULT_AUTO_RESOLVE_MINS: i64 = 60;

/// Warning/critical bounds for a named metric. An unset bound means "no
/// limit on that side".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThreshold {
    #[serde(default)]
    pub warning_min: Option<f64>,
    #[serde(default)]
    pub warning_max: Option<f64>,
    #[serde(default)]
    pub critical_min: Option<f64>,
    #[serde(default)]
    pub critical_max: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_auto_resolve_timeout")]
    pub auto_resolve_timeout_mins: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_auto_resolve_timeout() -> i64 {
    DEFAULT_AUTO_RESOLVE_MINS
}

/// Partial threshold update; unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub warning_min: Option<f64>,
    pub warning_max: Option<f64>,
    pub critical_min: Option<f64>,
    pub critical_max: Option<f64>,
    pub enabled: Option<bool>,
    pub auto_resolve_timeout_mins: Option<i64>,
}

/// A classified bound violation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub severity: Severity,
    /// The bound that was crossed, carried into the alert's threshold field.
    pub bound: f64,
}

impl AlertThreshold {
    /// Critical bounds, when present alongside the matching warning bound,
    /// must be strictly more extreme.
    pub fn is_valid(&self) -> bool {
        if let (Some(w), Some(c)) = (self.warning_max, self.critical_max) {
            if c <= w {
                return false;
            }
        }
        if let (Some(w), Some(c)) = (self.warning_min, self.critical_min) {
            if c >= w {
                return false;
            }
        }
        true
    }

    /// Classifies `value` against the bounds. Critical wins over warning;
    /// a warning-side breach escalates from medium to high once the value
    /// crosses the midpoint toward the critical bound (or immediately when
    /// no critical bound exists on that side).
    pub fn classify(&self, value: f64) -> Option<Breach> {
        if !self.enabled {
            return None;
        }

        if let Some(c) = self.critical_max {
            if value > c {
                return Some(Breach {
                    severity: Severity::Critical,
                    bound: c,
                });
            }
        }
        if let Some(w) = self.warning_max {
            if value > w {
                let severity = match self.critical_max {
                    Some(c) if value < w + (c - w) / 2.0 => Severity::Medium,
                    _ => Severity::High,
                };
                return Some(Breach {
                    severity,
                    bound: w,
                });
            }
        }

        if let Some(c) = self.critical_min {
            if value < c {
                return Some(Breach {
                    severity: Severity::Critical,
                    bound: c,
                });
            }
        }
        if let Some(w) = self.warning_min {
            if value < w {
                let severity = match self.critical_min {
                    Some(c) if value > w - (w - c) / 2.0 => Severity::Medium,
                    _ => Severity::High,
                };
                return Some(Breach {
                    severity,
                    bound: w,
                });
            }
        }

        None
    }
}

/// Read-mostly registry of thresholds keyed by metric name.
#[derive(Debug, Clone)]
pub struct ThresholdRegistry {
    thresholds: HashMap<String, AlertThreshold>,
}

impl ThresholdRegistry {
    /// Hard-coded defaults for the metrics the built-in collectors watch.
    pub fn defaults() -> Self {
        let mut thresholds = HashMap::new();
        thresholds.insert(
            "response_time".to_string(),
            AlertThreshold {
                warning_min: None,
                warning_max: Some(1000.0),
                critical_min: None,
                critical_max: Some(3000.0),
                enabled: true,
                auto_resolve_timeout_mins: 60,
            },
        );
        thresholds.insert(
            "error_rate".to_string(),
            AlertThreshold {
                warning_min: None,
                warning_max: Some(5.0),
                critical_min: None,
                critical_max: Some(15.0),
                enabled: true,
                auto_resolve_timeout_mins: 60,
            },
        );
        thresholds.insert(
            "revenue".to_string(),
            AlertThreshold {
                warning_min: Some(1000.0),
                warning_max: None,
                critical_min: Some(100.0),
                critical_max: None,
                enabled: true,
                auto_resolve_timeout_mins: 240,
            },
        );
        thresholds.insert(
            "conversion_rate".to_string(),
            AlertThreshold {
                warning_min: Some(1.0),
                warning_max: None,
                critical_min: Some(0.25),
                critical_max: None,
                enabled: true,
                auto_resolve_timeout_mins: 240,
            },
        );
        Self { thresholds }
    }

    /// Builds a registry from configured entries, falling back to the
    /// hard-coded default for any entry that fails validation.
    pub fn from_entries(entries: HashMap<String, AlertThreshold>) -> Self {
        let mut registry = Self::defaults();
        for (metric, threshold) in entries {
            if threshold.is_valid() {
                registry.thresholds.insert(metric, threshold);
            } else {
                tracing::warn!(
                    metric = %metric,
                    "Invalid threshold (critical bound not beyond warning), keeping default"
                );
            }
        }
        registry
    }

    pub fn get(&self, metric: &str) -> Option<&AlertThreshold> {
        self.thresholds.get(metric)
    }

    /// Classifies `value` against the named metric's bounds; `None` when
    /// the metric is unknown, disabled, or within bounds.
    pub fn classify(&self, metric: &str, value: f64) -> Option<Breach> {
        self.thresholds.get(metric)?.classify(value)
    }

    /// Merges a partial update into an existing entry. Deliberately not an
    /// upsert: unknown metrics are a logged no-op.
    pub fn update(&mut self, metric: &str, update: ThresholdUpdate) -> bool {
        let Some(threshold) = self.thresholds.get_mut(metric) else {
            tracing::warn!(metric, "Threshold update for unknown metric ignored");
            return false;
        };
        if let Some(v) = update.warning_min {
            threshold.warning_min = Some(v);
        }
        if let Some(v) = update.warning_max {
            threshold.warning_max = Some(v);
        }
        if let Some(v) = update.critical_min {
            threshold.critical_min = Some(v);
        }
        if let Some(v) = update.critical_max {
            threshold.critical_max = Some(v);
        }
        if let Some(v) = update.enabled {
            threshold.enabled = v;
        }
        if let Some(v) = update.auto_resolve_timeout_mins {
            threshold.auto_resolve_timeout_mins = v;
        }
        true
    }

    /// Auto-resolve timeout for a metric, falling back to
    /// [`DEFAULT_AUTO_RESOLVE_MINS`] when the metric has no entry.
    pub fn auto_resolve_timeout(&self, metric: Option<&str>) -> i64 {
        metric
            .and_then(|m| self.thresholds.get(m))
            .map(|t| t.auto_resolve_timeout_mins)
            .unwrap_or(DEFAULT_AUTO_RESOLVE_MINS)
    }
}

impl Default for ThresholdRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}
