//! The engine facade: one explicitly constructed instance per process,
//! injected into whatever host exposes it (HTTP handlers, a TUI, tests).

use crate::config::EngineConfig;
use crate::scheduler::PipelineScheduler;
use anyhow::Result;
use argus_alert::engine::{AdmissionConfig, AlertEngine};
use argus_alert::lifecycle::{EscalationPolicy, LifecycleManager, NoopEscalation};
use argus_alert::pattern::{NoopPatternLearner, PatternLearner};
use argus_alert::sources::business::BusinessSource;
use argus_alert::sources::performance::PerformanceSource;
use argus_alert::sources::realtime::RealtimeAnomalySource;
use argus_alert::sources::workflow::WorkflowSource;
use argus_alert::thresholds::{ThresholdRegistry, ThresholdUpdate};
use argus_alert::AlertSource;
use argus_common::types::{default_channels, Alert, AlertStats, ChannelType, Severity};
use argus_notify::channels::dashboard::DashboardChannel;
use argus_notify::channels::email::EmailChannel;
use argus_notify::channels::slack::SlackChannel;
use argus_notify::channels::telegram::TelegramChannel;
use argus_notify::channels::webhook::WebhookChannel;
use argus_notify::dispatcher::NotificationDispatcher;
use argus_notify::registry::ChannelRegistry;
use argus_storage::{AlertStore, MetricSource, NotificationStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;

pub struct ArgusEngine {
    config: EngineConfig,
    engine: Arc<Mutex<AlertEngine>>,
    thresholds: Arc<RwLock<ThresholdRegistry>>,
    lifecycle: Arc<LifecycleManager>,
    scheduler: Arc<PipelineScheduler>,
    store: Arc<dyn AlertStore>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl ArgusEngine {
    /// Wires the engine with the default (no-op) escalation policy and
    /// pattern learner.
    pub fn new(
        config: EngineConfig,
        metric_source: Arc<dyn MetricSource>,
        alert_store: Arc<dyn AlertStore>,
        notification_store: Arc<dyn NotificationStore>,
    ) -> Self {
        Self::with_extensions(
            config,
            metric_source,
            alert_store,
            notification_store,
            Arc::new(NoopEscalation),
            Arc::new(NoopPatternLearner),
        )
    }

    pub fn with_extensions(
        config: EngineConfig,
        metric_source: Arc<dyn MetricSource>,
        alert_store: Arc<dyn AlertStore>,
        notification_store: Arc<dyn NotificationStore>,
        escalation: Arc<dyn EscalationPolicy>,
        learner: Arc<dyn PatternLearner>,
    ) -> Self {
        let thresholds = Arc::new(RwLock::new(ThresholdRegistry::from_entries(
            config.thresholds.clone(),
        )));

        let engine = Arc::new(Mutex::new(AlertEngine::new(AdmissionConfig {
            max_alerts_per_hour: config.max_alerts_per_hour,
            auto_acknowledge_duplicates: config.auto_acknowledge_duplicates,
            rate_limiting: config.notifications.rate_limiting,
        })));

        let registry = build_channel_registry(&config, notification_store);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            registry,
            config.notifications.send_timeout_secs,
        ));

        let sources: Vec<Arc<dyn AlertSource>> = vec![
            Arc::new(RealtimeAnomalySource::new(
                metric_source.clone(),
                config.anomaly.clone(),
            )),
            Arc::new(PerformanceSource::new(
                metric_source.clone(),
                thresholds.clone(),
            )),
            Arc::new(BusinessSource::new(
                metric_source.clone(),
                thresholds.clone(),
            )),
            Arc::new(WorkflowSource::new(metric_source)),
        ];

        let lifecycle = Arc::new(LifecycleManager::new(
            engine.clone(),
            thresholds.clone(),
            alert_store.clone(),
            escalation,
            config.notifications.escalation_enabled,
            config.notifications.escalation_timeout_mins,
        ));

        let scheduler = Arc::new(PipelineScheduler::new(
            sources,
            engine.clone(),
            alert_store.clone(),
            dispatcher,
            learner,
            lifecycle.clone(),
            config.update_interval_secs,
            config.cleanup_interval_secs,
            config.collect_timeout_secs,
        ));

        Self {
            config,
            engine,
            thresholds,
            lifecycle,
            scheduler,
            store: alert_store,
            tasks: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Warms the active set from persistence and spawns the pipeline and
    /// lifecycle tasks. Safe to call when disabled (no-op) or when already
    /// running (logged, no second scheduler).
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("Alerting engine disabled by configuration");
            return Ok(());
        }
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Alerting engine already running");
            return Ok(());
        }

        let warm_timeout = std::time::Duration::from_secs(self.config.collect_timeout_secs.max(1));
        match tokio::time::timeout(warm_timeout, self.store.load_unresolved()).await {
            Ok(Ok(alerts)) => {
                let mut engine = self
                    .engine
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                engine.warm(alerts);
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to load unresolved alerts, starting cold");
            }
            Err(_) => {
                tracing::error!("Loading unresolved alerts timed out, starting cold");
            }
        }

        let pipeline = self.scheduler.clone();
        let pipeline_task = tokio::spawn(async move { pipeline.run().await });
        let sweep = self.scheduler.clone();
        let sweep_task = tokio::spawn(async move { sweep.run_cleanup().await });

        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend([pipeline_task, sweep_task]);

        tracing::info!(
            update_interval_secs = self.config.update_interval_secs,
            "Alerting engine started"
        );
        Ok(())
    }

    /// Stops scheduling future ticks. In-flight work is not cancelled by
    /// callers anywhere else; aborting between ticks is safe because each
    /// tick leaves the shared state consistent before yielding.
    pub fn stop(&self) {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for task in tasks.drain(..) {
            task.abort();
        }
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Alerting engine stopped");
    }

    /// Runs one pipeline pass inline; used by embeddings without the
    /// background scheduler and by the test suite.
    pub async fn run_tick_once(&self) {
        self.scheduler.run_tick(chrono::Utc::now()).await;
    }

    /// Runs one lifecycle sweep inline.
    pub async fn run_cleanup_once(&self) {
        self.lifecycle.cleanup(chrono::Utc::now()).await;
    }

    pub fn get_active_alerts(&self) -> Vec<Alert> {
        self.engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .active_alerts()
    }

    pub async fn acknowledge(&self, id: &str) -> bool {
        self.lifecycle.acknowledge(id).await
    }

    pub async fn resolve(&self, id: &str) -> bool {
        self.lifecycle.resolve(id).await
    }

    pub fn update_threshold(&self, metric: &str, update: ThresholdUpdate) -> bool {
        self.lifecycle.update_threshold(metric, update)
    }

    pub fn get_statistics(&self) -> AlertStats {
        self.engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .stats()
    }

    /// Current bounds for a metric, mainly for operational introspection.
    pub fn get_threshold(&self, metric: &str) -> Option<argus_alert::thresholds::AlertThreshold> {
        self.thresholds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(metric)
            .cloned()
    }
}

impl Drop for ArgusEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Severities a channel accepts by default: exactly those whose default
/// routing includes it. The webhook channel sits outside the severity
/// matrix and accepts everything its snapshot membership grants it.
fn default_filter(channel_type: ChannelType) -> Vec<Severity> {
    if channel_type == ChannelType::Webhook {
        return Severity::ALL.to_vec();
    }
    Severity::ALL
        .iter()
        .copied()
        .filter(|s| default_channels(*s).contains(&channel_type))
        .collect()
}

/// Builds the channel registry from configuration presence. A channel
/// whose construction fails is logged and left unregistered; the dashboard
/// channel is always present and accepts every severity.
fn build_channel_registry(
    config: &EngineConfig,
    notification_store: Arc<dyn NotificationStore>,
) -> ChannelRegistry {
    let mut registry = ChannelRegistry::new();
    let channels = config.channels.clone().with_env_fallback();

    registry.register(
        Arc::new(DashboardChannel::new(notification_store)),
        true,
        Severity::ALL.to_vec(),
    );

    if let Some(email) = &channels.email {
        match EmailChannel::new(email) {
            Ok(channel) => registry.register(
                Arc::new(channel),
                true,
                default_filter(ChannelType::Email),
            ),
            Err(e) => tracing::error!(error = %e, "Email channel misconfigured, skipping"),
        }
    }

    if let Some(slack) = &channels.slack {
        registry.register(
            Arc::new(SlackChannel::new(&slack.webhook_url)),
            true,
            default_filter(ChannelType::Slack),
        );
    }

    if let Some(telegram) = &channels.telegram {
        match TelegramChannel::new(&telegram.bot_token, &telegram.chat_id) {
            Ok(channel) => registry.register(
                Arc::new(channel),
                true,
                default_filter(ChannelType::Telegram),
            ),
            Err(e) => tracing::error!(error = %e, "Telegram channel misconfigured, skipping"),
        }
    }

    if let Some(webhook) = &channels.webhook {
        registry.register(
            Arc::new(WebhookChannel::new(&webhook.url)),
            true,
            default_filter(ChannelType::Webhook),
        );
    }

    registry
}
