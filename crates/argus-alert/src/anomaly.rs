//! Rolling-window statistical anomaly detection.
//!
//! [`detect`] is a pure function: given an ordered series where the last
//! element is the current observation, it measures how far that observation
//! sits from the historical distribution in population standard deviations.

use argus_common::types::Severity;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the z-score detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Detection sensitivity, 1 (lenient) to 10 (strict); the z-score
    /// threshold is `sensitivity / 2`.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,
    /// Minimum series length before any verdict is produced.
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,
    /// Verdicts with lower confidence are discarded by the caller.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            min_data_points: default_min_data_points(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

fn default_sensitivity() -> u8 {
    5
}

fn default_min_data_points() -> usize {
    10
}

fn default_confidence_threshold() -> f64 {
    0.7
}

impl AnomalyConfig {
    /// z-score threshold derived from sensitivity; ranges 0.5–5.0.
    pub fn z_threshold(&self) -> f64 {
        f64::from(self.sensitivity.clamp(1, 10)) / 2.0
    }
}

/// Outcome of an anomaly check on a single metric series.
#[derive(Debug, Clone)]
pub struct AnomalyVerdict {
    pub severity: Severity,
    /// Bounded heuristic in [0, 0.95] — a routing aid, not a calibrated
    /// probability.
    pub confidence: f64,
    pub z_score: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub current: f64,
    pub sample_size: usize,
}

/// Checks the last element of `samples` against the distribution of all
/// preceding elements.
///
/// Returns `None` when the series is shorter than `min_data_points`, when
/// the historical window has zero variance, or when the deviation stays
/// within the sensitivity threshold. Never low severity: this detector
/// only reports medium and above.
pub fn detect(metric: &str, samples: &[f64], config: &AnomalyConfig) -> Option<AnomalyVerdict> {
    if samples.len() < config.min_data_points {
        tracing::debug!(
            metric,
            samples = samples.len(),
            required = config.min_data_points,
            "Insufficient data for anomaly check"
        );
        return None;
    }

    let (history, current) = match samples.split_last() {
        Some((current, history)) => (history, *current),
        None => return None,
    };

    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    // Constant history: any exact repeat is normal, anything else has no
    // meaningful z-score. Treated as "no anomaly", never an error.
    if std_dev < f64::EPSILON {
        return None;
    }

    let z = (current - mean).abs() / std_dev;
    let t = config.z_threshold();

    if z <= t {
        return None;
    }

    let severity = if z > 2.0 * t {
        Severity::Critical
    } else if z > 1.5 * t {
        Severity::High
    } else {
        Severity::Medium
    };

    let confidence = ((z / t) * 0.5).min(0.95);

    Some(AnomalyVerdict {
        severity,
        confidence,
        z_score: z,
        mean,
        std_dev,
        current,
        sample_size: samples.len(),
    })
}
