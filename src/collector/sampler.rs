//! Polling of worker load signals.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

use crate::collector::snapshot::{MetricsSnapshot, RequestRate, RequestsData};
use crate::load_balancer::backend::{Worker, WorkerId};
use crate::load_balancer::pool::WorkerPool;
use crate::worker::{WorkerClient, WorkerError};

/// A load sample that could not be taken.
#[derive(Debug, Error)]
#[error("sampling {worker} failed: {source}")]
pub struct SampleError {
    pub worker: WorkerId,
    #[source]
    pub source: WorkerError,
}

/// Pulls CPU load and request rate from workers.
pub struct MetricsCollector {
    pool: Arc<WorkerPool>,
    client: Arc<dyn WorkerClient>,
    timeout: Duration,
}

impl MetricsCollector {
    pub fn new(pool: Arc<WorkerPool>, client: Arc<dyn WorkerClient>, timeout: Duration) -> Self {
        Self {
            pool,
            client,
            timeout,
        }
    }

    /// Poll one worker's CPU load and record it as its last observed load.
    pub async fn try_load_of(&self, worker: &Worker) -> Result<u8, SampleError> {
        let usage = match time::timeout(self.timeout, self.client.cpu_usage(&worker.id)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.timeout)),
        }
        .map_err(|source| SampleError {
            worker: worker.id.clone(),
            source,
        })?;

        worker.record_load(usage);
        Ok(usage)
    }

    /// Poll one worker's CPU load; a failed poll reads as 0.
    pub async fn load_of(&self, worker: &Worker) -> u8 {
        match self.try_load_of(worker).await {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(worker = %e.worker, error = %e.source, "Error fetching CPU usage");
                worker.record_load(0);
                0
            }
        }
    }

    /// Poll one worker's request rate; a failed poll reads as 0.
    pub async fn request_rate(&self, worker: &Worker) -> f64 {
        let result = match time::timeout(self.timeout, self.client.requests_per_second(&worker.id)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.timeout)),
        };

        match result {
            Ok(rate) if rate.is_finite() && rate >= 0.0 => rate,
            Ok(rate) => {
                tracing::warn!(worker = %worker.id, rate, "Ignoring invalid request rate");
                0.0
            }
            Err(e) => {
                tracing::warn!(worker = %worker.id, error = %e, "Error fetching requests per second");
                0.0
            }
        }
    }

    /// Current load of every primary worker, in pool order.
    pub async fn primary_loads(&self) -> Vec<(Arc<Worker>, u8)> {
        let primary = self.pool.primary();
        let loads = join_all(primary.iter().map(|w| self.load_of(w))).await;
        primary.into_iter().zip(loads).collect()
    }

    /// Take a fresh load sample from every worker given; the first failure is
    /// returned after all polls have finished.
    pub async fn refresh_loads(&self, workers: &[Arc<Worker>]) -> Result<(), SampleError> {
        join_all(workers.iter().map(|w| self.try_load_of(w)))
            .await
            .into_iter()
            .find_map(Result::err)
            .map_or(Ok(()), Err)
    }

    /// Request rate of every primary worker.
    pub async fn request_rates(&self) -> RequestsData {
        let primary = self.pool.primary();
        let rates = join_all(primary.iter().map(|w| self.request_rate(w))).await;

        RequestsData {
            request_counts: primary
                .iter()
                .zip(rates)
                .map(|(w, requests_per_second)| RequestRate {
                    server: w.id.clone(),
                    requests_per_second,
                })
                .collect(),
        }
    }

    /// CPU usage and connection count of every primary worker.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        for (worker, usage) in self.primary_loads().await {
            snapshot.cpu_usages.insert(worker.id.clone(), usage);
            snapshot.request_counts.insert(worker.id.clone(), worker.connections());
        }
        snapshot
    }
}
