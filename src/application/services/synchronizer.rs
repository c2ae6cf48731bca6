use crate::application::ports::NewsNotifier;
use crate::application::services::sync_engine::SyncEngine;
use crate::domain::entities::SyncReport;
use crate::domain::value_objects::SyncCollection;
use crate::shared::config::SyncConfig;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub active_rounds: u32,
    pub last_sync_ms: Option<i64>,
    pub consecutive_failures: u32,
    pub last_report: Option<SyncReport>,
}

/// Observable synchronizer state. Readers never wait on a running round.
#[derive(Debug, Clone)]
pub struct SyncStatusMonitor {
    sender: Arc<watch::Sender<SyncStatus>>,
}

impl Default for SyncStatusMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStatusMonitor {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SyncStatus::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> SyncStatus {
        self.sender.borrow().clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.sender.borrow().is_syncing
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.sender.subscribe()
    }

    fn mark_started(&self) {
        self.sender.send_modify(|status| {
            status.active_rounds = status.active_rounds.saturating_add(1);
            status.is_syncing = true;
        });
    }

    // Rounds may overlap (periodic loop plus a manual trigger), so syncing
    // only ends when the last one finishes.
    fn mark_finished(&self, report: &SyncReport) {
        self.sender.send_modify(|status| {
            status.active_rounds = status.active_rounds.saturating_sub(1);
            status.is_syncing = status.active_rounds > 0;
            status.last_sync_ms = Some(report.finished_at_ms);
            if report.has_failures() {
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            } else if report.all_succeeded() {
                status.consecutive_failures = 0;
            }
            status.last_report = Some(report.clone());
        });
    }
}

/// Drives sync rounds over every collection and hands newly added news
/// resources to the notifier.
pub struct Synchronizer {
    engine: Arc<SyncEngine>,
    notifier: Arc<dyn NewsNotifier>,
    config: SyncConfig,
    status: SyncStatusMonitor,
}

impl Synchronizer {
    pub fn new(engine: Arc<SyncEngine>, notifier: Arc<dyn NewsNotifier>, config: SyncConfig) -> Self {
        Self {
            engine,
            notifier,
            config,
            status: SyncStatusMonitor::new(),
        }
    }

    pub fn status(&self) -> &SyncStatusMonitor {
        &self.status
    }

    pub async fn sync_once(&self) -> SyncReport {
        self.sync_once_with_cancellation(&CancellationToken::new())
            .await
    }

    pub async fn sync_once_with_cancellation(&self, cancel: &CancellationToken) -> SyncReport {
        let started_at_ms = Utc::now().timestamp_millis();
        self.status.mark_started();

        let (topics, news) = tokio::join!(
            self.engine
                .run_with_cancellation(SyncCollection::Topics, cancel),
            self.engine
                .run_with_cancellation(SyncCollection::NewsResources, cancel),
        );

        let notified_count = self.post_notifications(&news.notify_ids).await;

        let report = SyncReport {
            results: vec![topics, news],
            notified_count,
            started_at_ms,
            finished_at_ms: Utc::now().timestamp_millis(),
        };
        self.status.mark_finished(&report);

        tracing::info!(
            target: "sync::scheduler",
            all_succeeded = report.all_succeeded(),
            needs_retry = report.needs_retry(),
            notified = notified_count,
            elapsed_ms = report.finished_at_ms - report.started_at_ms,
            "sync round finished"
        );
        report
    }

    async fn post_notifications(&self, ids: &[String]) -> u32 {
        if ids.is_empty() {
            return 0;
        }

        let resources = match self.engine.local_store().get_news_resources(ids).await {
            Ok(resources) => resources,
            Err(err) => {
                tracing::warn!(
                    target: "sync::scheduler",
                    error = %err,
                    "failed to load news resources for notification"
                );
                return 0;
            }
        };
        if resources.is_empty() {
            return 0;
        }

        match self.notifier.post_news_notifications(&resources).await {
            Ok(()) => resources.len() as u32,
            Err(err) => {
                tracing::warn!(
                    target: "sync::scheduler",
                    error = %err,
                    count = resources.len(),
                    "failed to post news notifications"
                );
                0
            }
        }
    }

    /// Starts the periodic loop. Returns `None` when automatic sync is
    /// disabled in the configuration.
    pub fn spawn_periodic(self: Arc<Self>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        if !self.config.auto_sync {
            tracing::debug!(target: "sync::scheduler", "automatic sync disabled");
            return None;
        }

        let handle = tokio::spawn(async move {
            let interval = Duration::from_secs(self.config.interval_secs.max(1));
            let mut failed_rounds: u32 = 0;

            loop {
                let report = self.sync_once_with_cancellation(&cancel).await;
                if cancel.is_cancelled() {
                    break;
                }

                let delay = if report.needs_retry() {
                    failed_rounds = failed_rounds.saturating_add(1);
                    with_jitter(retry_delay(
                        self.config.retry_base_secs,
                        self.config.retry_max_secs,
                        failed_rounds,
                    ))
                } else {
                    failed_rounds = 0;
                    interval
                };

                tracing::debug!(
                    target: "sync::scheduler",
                    delay_ms = delay.as_millis() as u64,
                    failed_rounds,
                    "next sync round scheduled"
                );

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            tracing::info!(target: "sync::scheduler", "periodic sync stopped");
        });
        Some(handle)
    }
}

/// Exponential backoff for the `attempt`-th consecutive failed round
/// (1-based), capped at `max_secs`.
pub fn retry_delay(base_secs: u64, max_secs: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let secs = base_secs.saturating_mul(1u64 << exponent).min(max_secs);
    Duration::from_secs(secs)
}

// Adds up to 10% random extra delay.
fn with_jitter(delay: Duration) -> Duration {
    let max_jitter_ms = (delay.as_millis() / 10) as u64;
    if max_jitter_ms == 0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(0..=max_jitter_ms);
    delay + Duration::from_millis(jitter)
}
