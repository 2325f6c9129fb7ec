use crate::anomaly::{detect, AnomalyConfig};
use crate::engine::{AdmissionConfig, AlertEngine};
use crate::lifecycle::{EscalationPolicy, LifecycleManager, NoopEscalation};
use crate::limiter::RateLimiter;
use crate::thresholds::{AlertThreshold, ThresholdRegistry, ThresholdUpdate};
use anyhow::Result;
use argus_common::id::alert_id;
use argus_common::types::{default_channels, Alert, AlertType, ChannelType, Severity};
use argus_storage::memory::MemoryAlertStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

fn make_alert(
    alert_type: AlertType,
    metric: &str,
    severity: Severity,
    created_at: DateTime<Utc>,
) -> Alert {
    Alert {
        id: alert_id(alert_type, metric, created_at),
        alert_type,
        severity,
        title: format!("{metric} alert"),
        message: "test".into(),
        source: "test_source".into(),
        metric: Some(metric.to_string()),
        current_value: Some(1.0),
        expected_value: None,
        threshold_value: None,
        confidence: 1.0,
        acknowledged: false,
        resolved: false,
        auto_resolve: true,
        suggested_actions: vec![],
        related_alerts: vec![],
        channels: default_channels(severity),
        metadata: HashMap::new(),
        created_at,
    }
}

fn anomaly_config(sensitivity: u8) -> AnomalyConfig {
    AnomalyConfig {
        sensitivity,
        min_data_points: 5,
        confidence_threshold: 0.0,
    }
}

// ---- anomaly detector ----

#[test]
fn anomaly_requires_min_data_points() {
    let config = AnomalyConfig {
        min_data_points: 10,
        ..anomaly_config(5)
    };
    let samples = vec![1.0; 9];
    assert!(detect("revenue", &samples, &config).is_none());
}

#[test]
fn anomaly_zero_variance_is_not_an_anomaly() {
    let config = anomaly_config(5);
    // Constant history, identical current value
    let samples = vec![1000.0; 11];
    assert!(detect("revenue", &samples, &config).is_none());

    // Constant history, wildly different current value: still no verdict,
    // the z-score is undefined
    let mut spiked = vec![1000.0; 10];
    spiked.push(5000.0);
    assert!(detect("revenue", &spiked, &config).is_none());
}

#[test]
fn anomaly_within_threshold_is_quiet() {
    let config = anomaly_config(5); // t = 2.5
    let mut samples: Vec<f64> = (0..10)
        .map(|i| if i % 2 == 0 { 950.0 } else { 1050.0 })
        .collect();
    samples.push(1040.0); // well within 2.5 sigma of the mean
    assert!(detect("revenue", &samples, &config).is_none());
}

#[test]
fn anomaly_severity_tiers() {
    // history mean 1000, population stddev 50; t = 2.5
    let history: Vec<f64> = (0..10)
        .map(|i| if i % 2 == 0 { 950.0 } else { 1050.0 })
        .collect();
    let config = anomaly_config(5);

    // z = 3.0: above t but below 1.5t -> medium
    let mut samples = history.clone();
    samples.push(1150.0);
    let verdict = detect("clicks", &samples, &config).unwrap();
    assert_eq!(verdict.severity, Severity::Medium);

    // z = 4.0: above 1.5t (3.75) but below 2t (5.0) -> high
    let mut samples = history.clone();
    samples.push(1200.0);
    let verdict = detect("clicks", &samples, &config).unwrap();
    assert_eq!(verdict.severity, Severity::High);

    // z = 6.0: above 2t -> critical
    let mut samples = history.clone();
    samples.push(1300.0);
    let verdict = detect("clicks", &samples, &config).unwrap();
    assert_eq!(verdict.severity, Severity::Critical);
}

#[test]
fn anomaly_confidence_capped_and_monotone() {
    let history: Vec<f64> = (0..10)
        .map(|i| if i % 2 == 0 { 950.0 } else { 1050.0 })
        .collect();
    let config = anomaly_config(7); // t = 3.5

    // mean 1000, stddev 50, current 5000 -> z = 80
    let mut samples = history.clone();
    samples.push(5000.0);
    let verdict = detect("revenue", &samples, &config).unwrap();
    assert_eq!(verdict.severity, Severity::Critical);
    assert!((verdict.confidence - 0.95).abs() < 1e-9);

    // Growing |current - mean| never lowers z or confidence
    let mut last_z = 0.0;
    let mut last_confidence = 0.0;
    for current in [1200.0, 1400.0, 1800.0, 2600.0, 5000.0] {
        let mut samples = history.clone();
        samples.push(current);
        let verdict = detect("revenue", &samples, &config).unwrap();
        assert!(verdict.z_score >= last_z);
        assert!(verdict.confidence >= last_confidence);
        last_z = verdict.z_score;
        last_confidence = verdict.confidence;
    }
}

// ---- thresholds ----

#[test]
fn threshold_classify_max_side() {
    let registry = ThresholdRegistry::defaults();

    // response_time: warning 1000, critical 3000, midpoint 2000
    assert!(registry.classify("response_time", 500.0).is_none());
    assert_eq!(
        registry.classify("response_time", 1500.0).unwrap().severity,
        Severity::Medium
    );
    assert_eq!(
        registry.classify("response_time", 2500.0).unwrap().severity,
        Severity::High
    );
    assert_eq!(
        registry.classify("response_time", 3500.0).unwrap().severity,
        Severity::Critical
    );
}

#[test]
fn threshold_classify_min_side() {
    let registry = ThresholdRegistry::defaults();

    // revenue: warning floor 1000, critical floor 100, midpoint 550
    assert!(registry.classify("revenue", 5000.0).is_none());
    assert_eq!(
        registry.classify("revenue", 800.0).unwrap().severity,
        Severity::Medium
    );
    assert_eq!(
        registry.classify("revenue", 300.0).unwrap().severity,
        Severity::High
    );
    assert_eq!(
        registry.classify("revenue", 50.0).unwrap().severity,
        Severity::Critical
    );
}

#[test]
fn threshold_disabled_never_matches() {
    let mut registry = ThresholdRegistry::defaults();
    registry.update(
        "response_time",
        ThresholdUpdate {
            enabled: Some(false),
            ..Default::default()
        },
    );
    assert!(registry.classify("response_time", 10_000.0).is_none());
}

#[test]
fn threshold_invalid_entry_falls_back_to_default() {
    let mut entries = HashMap::new();
    entries.insert(
        "response_time".to_string(),
        AlertThreshold {
            warning_min: None,
            warning_max: Some(3000.0),
            critical_min: None,
            critical_max: Some(1000.0), // critical below warning: invalid
            enabled: true,
            auto_resolve_timeout_mins: 60,
        },
    );
    let registry = ThresholdRegistry::from_entries(entries);
    // default kept: 3500 is past the default critical bound
    assert_eq!(
        registry.classify("response_time", 3500.0).unwrap().severity,
        Severity::Critical
    );
}

#[test]
fn threshold_update_merges_and_ignores_unknown() {
    let mut registry = ThresholdRegistry::defaults();
    assert!(registry.update(
        "response_time",
        ThresholdUpdate {
            warning_max: Some(500.0),
            ..Default::default()
        },
    ));
    // merged field applied, untouched field kept
    let t = registry.get("response_time").unwrap();
    assert_eq!(t.warning_max, Some(500.0));
    assert_eq!(t.critical_max, Some(3000.0));

    assert!(!registry.update("no_such_metric", ThresholdUpdate::default()));
    assert!(registry.get("no_such_metric").is_none());
}

// ---- rate limiter ----

#[test]
fn limiter_enforces_hourly_budget() {
    let mut limiter = RateLimiter::new(3);
    let now = Utc::now();
    for _ in 0..3 {
        assert!(limiter.try_acquire(AlertType::Anomaly, "revenue", now));
    }
    assert!(!limiter.try_acquire(AlertType::Anomaly, "revenue", now));
    // other keys have their own budget
    assert!(limiter.try_acquire(AlertType::Anomaly, "clicks", now));
}

#[test]
fn limiter_window_resets_after_an_hour() {
    let mut limiter = RateLimiter::new(1);
    let now = Utc::now();
    assert!(limiter.try_acquire(AlertType::Workflow, "workflow_failures", now));
    assert!(!limiter.try_acquire(AlertType::Workflow, "workflow_failures", now));
    let later = now + Duration::minutes(61);
    assert!(limiter.try_acquire(AlertType::Workflow, "workflow_failures", later));
}

// ---- admission engine ----

#[test]
fn engine_suppresses_duplicates_within_an_hour() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    let now = Utc::now();

    let first = make_alert(AlertType::Anomaly, "revenue", Severity::High, now);
    assert_eq!(engine.admit(vec![first], now).len(), 1);

    let dup = make_alert(
        AlertType::Anomaly,
        "revenue",
        Severity::High,
        now + Duration::minutes(5),
    );
    assert!(engine
        .admit(vec![dup], now + Duration::minutes(5))
        .is_empty());

    // auto_acknowledge_duplicates marks the survivor
    let survivor = &engine.active_alerts()[0];
    assert!(survivor.acknowledged);
}

#[test]
fn engine_accepts_same_tuple_after_resolution_and_an_hour() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    let now = Utc::now();

    let first = make_alert(AlertType::Anomaly, "revenue", Severity::High, now);
    let first_id = first.id.clone();
    engine.admit(vec![first], now);
    assert!(engine.resolve(&first_id).is_some());

    let later = now + Duration::minutes(90);
    let second = make_alert(AlertType::Anomaly, "revenue", Severity::High, later);
    assert_eq!(engine.admit(vec![second], later).len(), 1);
}

#[test]
fn engine_distinct_severity_is_not_a_duplicate() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    let now = Utc::now();

    engine.admit(
        vec![make_alert(AlertType::Anomaly, "revenue", Severity::High, now)],
        now,
    );
    let escalated = make_alert(
        AlertType::Anomaly,
        "revenue",
        Severity::Critical,
        now + Duration::seconds(30),
    );
    assert_eq!(engine.admit(vec![escalated], now).len(), 1);
}

#[test]
fn engine_rate_limits_shared_metric_budget() {
    let mut engine = AlertEngine::new(AdmissionConfig {
        max_alerts_per_hour: 3,
        auto_acknowledge_duplicates: false,
        rate_limiting: true,
    });
    let now = Utc::now();

    // Four distinct severities bypass dedup; the shared (type, metric)
    // budget admits exactly three.
    let candidates: Vec<Alert> = Severity::ALL
        .iter()
        .enumerate()
        .map(|(i, sev)| {
            make_alert(
                AlertType::Anomaly,
                "revenue",
                *sev,
                now + Duration::seconds(i as i64),
            )
        })
        .collect();

    let accepted = engine.admit(candidates, now);
    assert_eq!(accepted.len(), 3);
}

#[test]
fn engine_rate_limiting_can_be_disabled() {
    let mut engine = AlertEngine::new(AdmissionConfig {
        max_alerts_per_hour: 1,
        auto_acknowledge_duplicates: false,
        rate_limiting: false,
    });
    let now = Utc::now();
    let candidates: Vec<Alert> = Severity::ALL
        .iter()
        .enumerate()
        .map(|(i, sev)| {
            make_alert(
                AlertType::Business,
                "revenue",
                *sev,
                now + Duration::seconds(i as i64),
            )
        })
        .collect();
    assert_eq!(engine.admit(candidates, now).len(), 4);
}

#[test]
fn engine_resolve_unknown_id_is_false() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    assert!(engine.resolve("nope").is_none());
    assert!(!engine.acknowledge("nope"));
}

#[test]
fn engine_stats_count_by_severity_and_type() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    let now = Utc::now();

    engine.admit(
        vec![
            make_alert(AlertType::Anomaly, "revenue", Severity::Critical, now),
            make_alert(AlertType::Performance, "response_time", Severity::High, now),
            make_alert(AlertType::Workflow, "workflow_failures", Severity::High, now),
        ],
        now,
    );
    let resolved_id = alert_id(AlertType::Workflow, "workflow_failures", now);
    engine.resolve(&resolved_id);

    let stats = engine.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.resolved_count, 1);
    assert_eq!(stats.by_severity.get("critical"), Some(&1));
    assert_eq!(stats.by_severity.get("high"), Some(&1));
    assert_eq!(stats.by_type.get("anomaly"), Some(&1));
    assert_eq!(stats.acknowledged_count, 0);
}

#[test]
fn engine_active_alerts_most_severe_first() {
    let mut engine = AlertEngine::new(AdmissionConfig::default());
    let now = Utc::now();
    engine.admit(
        vec![
            make_alert(AlertType::Performance, "response_time", Severity::Medium, now),
            make_alert(AlertType::Anomaly, "revenue", Severity::Critical, now),
        ],
        now,
    );
    let active = engine.active_alerts();
    assert_eq!(active[0].severity, Severity::Critical);
    assert_eq!(active[1].severity, Severity::Medium);
}

// ---- lifecycle ----

struct RecordingEscalation {
    calls: AtomicUsize,
}

#[async_trait]
impl EscalationPolicy for RecordingEscalation {
    async fn escalate(&self, overdue: &[Alert]) -> Result<()> {
        self.calls.fetch_add(overdue.len(), Ordering::SeqCst);
        Ok(())
    }
}

fn lifecycle_fixture(
    escalation: Arc<dyn EscalationPolicy>,
    escalation_enabled: bool,
) -> (Arc<Mutex<AlertEngine>>, Arc<MemoryAlertStore>, LifecycleManager) {
    let engine = Arc::new(Mutex::new(AlertEngine::new(AdmissionConfig::default())));
    let thresholds = Arc::new(RwLock::new(ThresholdRegistry::defaults()));
    let store = Arc::new(MemoryAlertStore::new());
    let manager = LifecycleManager::new(
        engine.clone(),
        thresholds,
        store.clone(),
        escalation,
        escalation_enabled,
        30,
    );
    (engine, store, manager)
}

#[tokio::test]
async fn lifecycle_resolve_removes_and_persists() {
    let (engine, store, manager) = lifecycle_fixture(Arc::new(NoopEscalation), false);
    let now = Utc::now();
    let alert = make_alert(AlertType::Performance, "response_time", Severity::High, now);
    let id = alert.id.clone();
    engine.lock().unwrap().admit(vec![alert], now);

    assert!(manager.resolve(&id).await);
    assert!(engine.lock().unwrap().active_alerts().is_empty());
    assert!(store.get(&id).await.unwrap().resolved);

    assert!(!manager.resolve(&id).await);
}

#[tokio::test]
async fn lifecycle_acknowledge_does_not_resolve() {
    let (engine, _store, manager) = lifecycle_fixture(Arc::new(NoopEscalation), false);
    let now = Utc::now();
    let alert = make_alert(AlertType::Business, "revenue", Severity::High, now);
    let id = alert.id.clone();
    engine.lock().unwrap().admit(vec![alert], now);

    assert!(manager.acknowledge(&id).await);
    let active = engine.lock().unwrap().active_alerts();
    assert_eq!(active.len(), 1);
    assert!(active[0].acknowledged);
    assert!(!active[0].resolved);

    assert!(!manager.acknowledge("unknown-id").await);
}

#[tokio::test]
async fn lifecycle_cleanup_auto_resolves_after_timeout() {
    let (engine, store, manager) = lifecycle_fixture(Arc::new(NoopEscalation), false);
    let created = Utc::now() - Duration::minutes(120);

    // response_time auto-resolves after 60 minutes; the business alert has
    // auto_resolve = false and must survive any timeout.
    let stale = make_alert(AlertType::Performance, "response_time", Severity::High, created);
    let stale_id = stale.id.clone();
    let mut manual = make_alert(AlertType::Business, "revenue", Severity::High, created);
    manual.auto_resolve = false;
    engine.lock().unwrap().admit(vec![stale, manual], created);

    manager.cleanup(Utc::now()).await;

    let active = engine.lock().unwrap().active_alerts();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].metric.as_deref(), Some("revenue"));
    assert!(store.get(&stale_id).await.unwrap().resolved);
}

#[tokio::test]
async fn lifecycle_escalates_old_unacknowledged_alerts() {
    let escalation = Arc::new(RecordingEscalation {
        calls: AtomicUsize::new(0),
    });
    let (engine, _store, manager) = lifecycle_fixture(escalation.clone(), true);
    let created = Utc::now() - Duration::minutes(45);

    let overdue = make_alert(AlertType::Workflow, "workflow_failures", Severity::High, created);
    let mut acked = make_alert(AlertType::Anomaly, "clicks", Severity::High, created);
    acked.acknowledged = true;
    engine.lock().unwrap().admit(vec![overdue, acked], created);

    manager.escalation_check(Utc::now()).await;
    assert_eq!(escalation.calls.load(Ordering::SeqCst), 1);
}

// ---- channel routing snapshot ----

#[test]
fn default_channel_table_matches_severity_matrix() {
    assert_eq!(
        default_channels(Severity::Critical),
        vec![
            ChannelType::Dashboard,
            ChannelType::Email,
            ChannelType::Slack,
            ChannelType::Telegram,
        ]
    );
    assert_eq!(
        default_channels(Severity::High),
        vec![ChannelType::Dashboard, ChannelType::Email, ChannelType::Slack]
    );
    assert_eq!(
        default_channels(Severity::Medium),
        vec![ChannelType::Dashboard, ChannelType::Email]
    );
    assert_eq!(default_channels(Severity::Low), vec![ChannelType::Dashboard]);
}
