//! Active health checking.
//!
//! # Responsibilities
//! - Probe every worker (primary and standby) with a bounded-time check
//! - Update worker health state based on results
//! - Run periodically in the background and on demand before dispatch

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::load_balancer::backend::{Worker, WorkerId};
use crate::load_balancer::pool::WorkerPool;
use crate::observability::metrics;
use crate::worker::{WorkerClient, WorkerError};

pub struct HealthMonitor {
    pool: Arc<WorkerPool>,
    client: Arc<dyn WorkerClient>,
    config: HealthCheckConfig,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(
        pool: Arc<WorkerPool>,
        client: Arc<dyn WorkerClient>,
        config: HealthCheckConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            client,
            config,
            timeout,
        }
    }

    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Background health checks disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_ms = self.timeout.as_millis() as u64,
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every registered worker, primary and standby.
    pub async fn check_all(&self) -> HashMap<WorkerId, bool> {
        let workers = self.pool.all();
        self.probe_all(&workers).await
    }

    /// Probe the given workers concurrently and record the results.
    ///
    /// A failure of one probe never affects the others; the returned map has
    /// exactly one entry per distinct worker.
    pub async fn probe_all(&self, workers: &[Arc<Worker>]) -> HashMap<WorkerId, bool> {
        let probes = workers.iter().map(|worker| async move {
            let healthy = self.probe(worker).await;
            (worker.id.clone(), healthy)
        });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe(&self, worker: &Worker) -> bool {
        let result = match time::timeout(self.timeout, self.client.health(&worker.id)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.timeout)),
        };

        let healthy = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(worker = %worker.id, error = %e, "Health check failed");
                false
            }
        };

        if worker.set_healthy(healthy) {
            tracing::info!(worker = %worker.id, healthy, "Worker health changed");
        }
        metrics::record_worker_health(worker.id.as_str(), healthy);

        healthy
    }
}
