//! Background eviction of expired artifacts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::ArtifactStore;
use crate::jobs::JobStore;
use crate::metrics;

/// Outcome of a single reaper pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapReport {
    pub reaped: usize,
    /// Deletions that failed and stay queued for the next tick.
    pub failed: usize,
    pub tombstones_pruned: usize,
    pub jobs_pruned: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperStatus {
    pub running: bool,
    pub interval_ms: u64,
    pub last_report: Option<ReapReport>,
}

/// Periodically removes expired artifacts from an [`ArtifactStore`].
pub struct ExpiryReaper {
    store: Arc<dyn ArtifactStore>,
    interval: Duration,
    jobs: Option<(Arc<JobStore>, Duration)>,

    running: Arc<AtomicBool>,
    last_report: Arc<std::sync::Mutex<Option<ReapReport>>>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExpiryReaper {
    pub fn new(store: Arc<dyn ArtifactStore>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            interval,
            jobs: None,
            running: Arc::new(AtomicBool::new(false)),
            last_report: Arc::new(std::sync::Mutex::new(None)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// Also evict finished job records older than `retention`.
    pub fn with_job_store(mut self, jobs: Arc<JobStore>, retention: Duration) -> Self {
        self.jobs = Some((jobs, retention));
        self
    }

    /// Spawn the reaper loop.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Expiry reaper already running");
            return;
        }

        let store = Arc::clone(&self.store);
        let jobs = self.jobs.clone();
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        let last_report = Arc::clone(&self.last_report);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Expiry reaper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Expiry reaper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let report = Self::reap(store.as_ref(), jobs.as_ref()).await;
                        Self::record(&last_report, &report);
                        if report != ReapReport::default() {
                            info!(
                                reaped = report.reaped,
                                failed = report.failed,
                                tombstones_pruned = report.tombstones_pruned,
                                jobs_pruned = report.jobs_pruned,
                                "Reaper tick finished"
                            );
                        }
                    }
                }
            }
            info!("Expiry reaper stopped");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Expiry reaper not running");
            return;
        }

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Expiry reaper task ended abnormally: {}", e);
            }
        }
    }

    pub fn status(&self) -> ReaperStatus {
        ReaperStatus {
            running: self.running.load(Ordering::Relaxed),
            interval_ms: self.interval.as_millis() as u64,
            last_report: self
                .last_report
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default(),
        }
    }

    /// Run one pass immediately.
    pub async fn tick(&self) -> ReapReport {
        let report = Self::reap(self.store.as_ref(), self.jobs.as_ref()).await;
        Self::record(&self.last_report, &report);
        report
    }

    fn record(slot: &std::sync::Mutex<Option<ReapReport>>, report: &ReapReport) {
        if let Ok(mut guard) = slot.lock() {
            *guard = Some(report.clone());
        }
    }

    async fn reap(
        store: &dyn ArtifactStore,
        jobs: Option<&(Arc<JobStore>, Duration)>,
    ) -> ReapReport {
        let now = Utc::now();
        let mut report = ReapReport::default();

        // Only ids expired at snapshot time; later puts are untouched this tick.
        let expired = store.list_expired(now).await;
        for id in expired {
            match store.delete(&id).await {
                Ok(true) => {
                    report.reaped += 1;
                    debug!(artifact_id = %id, "Reaped expired artifact");
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(artifact_id = %id, error = %e, "Failed to reap artifact");
                }
            }
        }

        report.tombstones_pruned = store.prune_tombstones(now).await;

        if let Some((job_store, retention)) = jobs {
            report.jobs_pruned = job_store.prune_finished(now, *retention).await;
        }

        metrics::ARTIFACTS_REAPED.inc_by(report.reaped as u64);
        metrics::ARTIFACT_REAP_FAILURES.inc_by(report.failed as u64);
        metrics::ARTIFACTS_LIVE.set(store.len().await as i64);

        report
    }
}
