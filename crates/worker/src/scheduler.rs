//! Worker scheduler for background tasks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use messaging::NotificationDispatcher;
use store::{RetryPolicy, Store};
use telemetry::{log_snapshot, metrics};

use crate::outbox::{OutboxWorker, DEFAULT_OUTBOX_BATCH};
use crate::sweeper::ExpirySweeper;

/// Worker scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Expiry sweep interval in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Outbox poll interval in seconds
    #[serde(default = "default_outbox_interval_secs")]
    pub outbox_interval_secs: u64,
    /// Entries attempted per outbox run
    #[serde(default = "default_outbox_batch")]
    pub outbox_batch: usize,
    /// Metrics log interval in seconds
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_outbox_interval_secs() -> u64 {
    5
}

fn default_outbox_batch() -> usize {
    DEFAULT_OUTBOX_BATCH
}

fn default_metrics_interval_secs() -> u64 {
    60
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            outbox_interval_secs: default_outbox_interval_secs(),
            outbox_batch: default_outbox_batch(),
            metrics_interval_secs: default_metrics_interval_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    store: Arc<Store>,
    dispatcher: NotificationDispatcher,
}

impl WorkerScheduler {
    pub fn new(config: WorkerConfig, store: Arc<Store>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            config,
            store,
            dispatcher,
        }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        // Expiry sweeper
        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_expiry_sweeper().await;
        }));

        // Outbox worker
        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_outbox_worker().await;
        }));

        // Metrics log
        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_log().await;
        }));

        info!(
            sweep_interval_secs = self.config.sweep_interval_secs,
            outbox_interval_secs = self.config.outbox_interval_secs,
            "Background workers started"
        );
        handles
    }

    async fn run_expiry_sweeper(&self) {
        let sweeper = ExpirySweeper::new(self.store.clone());
        let mut ticker = interval(Duration::from_secs(self.config.sweep_interval_secs.max(1)));

        loop {
            ticker.tick().await;
            sweeper.run();
        }
    }

    async fn run_outbox_worker(&self) {
        let worker = OutboxWorker::new(
            self.store.clone(),
            self.dispatcher.clone(),
            self.config.retry.clone(),
        )
        .with_batch_size(self.config.outbox_batch);
        let mut ticker = interval(Duration::from_secs(self.config.outbox_interval_secs.max(1)));

        loop {
            ticker.tick().await;
            worker.run().await;
        }
    }

    async fn run_metrics_log(&self) {
        let mut ticker = interval(Duration::from_secs(self.config.metrics_interval_secs.max(1)));

        loop {
            ticker.tick().await;
            log_snapshot(&metrics().snapshot());
        }
    }
}
