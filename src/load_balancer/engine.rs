//! Routing engine: selection plus dispatch.
//!
//! # Responsibilities
//! - Reject requests early when the configured policy is unknown
//! - Refresh health of every worker before each selection
//! - Apply the configured policy to the healthy primary workers
//! - Forward the payload, holding a connection guard for the whole call
//! - Record the observed latency on success

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time;

use crate::collector::MetricsCollector;
use crate::config::LbConfig;
use crate::error::{LbError, LbResult};
use crate::health::active::HealthMonitor;
use crate::load_balancer::backend::{ConnectionGuard, Worker, WorkerId};
use crate::load_balancer::pool::WorkerPool;
use crate::load_balancer::{Algorithm, LoadBalancer, UnknownAlgorithm};
use crate::worker::{ProcessRequest, WorkerClient, WorkerError};

/// A request that a worker processed successfully.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub worker: WorkerId,
    pub response: serde_json::Value,
    pub elapsed: Duration,
}

pub struct RoutingEngine {
    pool: Arc<WorkerPool>,
    health: Arc<HealthMonitor>,
    collector: Arc<MetricsCollector>,
    client: Arc<dyn WorkerClient>,
    policy: Result<(Algorithm, Box<dyn LoadBalancer>), UnknownAlgorithm>,
    probe_on_dispatch: bool,
    dispatch_timeout: Duration,
    /// Serializes pick-and-acquire so concurrent selections see each other's
    /// connections.
    pick: Mutex<()>,
}

impl RoutingEngine {
    pub fn new(
        pool: Arc<WorkerPool>,
        health: Arc<HealthMonitor>,
        collector: Arc<MetricsCollector>,
        client: Arc<dyn WorkerClient>,
        config: &LbConfig,
    ) -> Self {
        let policy = config
            .balancer
            .algorithm
            .parse::<Algorithm>()
            .map(|algorithm| (algorithm, algorithm.build()));

        match &policy {
            Ok((algorithm, _)) => tracing::info!(algorithm = %algorithm, "Using load balancing algorithm"),
            Err(e) => tracing::error!(error = %e, "Requests will be rejected until the algorithm is fixed"),
        }

        Self {
            pool,
            health,
            collector,
            client,
            policy,
            probe_on_dispatch: config.balancer.probe_on_dispatch,
            dispatch_timeout: Duration::from_secs(config.timeouts.dispatch_secs),
            pick: Mutex::new(()),
        }
    }

    /// The configured algorithm, or the error every request will get.
    pub fn algorithm(&self) -> Result<Algorithm, UnknownAlgorithm> {
        self.policy
            .as_ref()
            .map(|(algorithm, _)| *algorithm)
            .map_err(Clone::clone)
    }

    fn policy(&self) -> LbResult<(Algorithm, &dyn LoadBalancer)> {
        match &self.policy {
            Ok((algorithm, lb)) => Ok((*algorithm, lb.as_ref())),
            Err(e) => Err(LbError::InvalidAlgorithm(e.clone())),
        }
    }

    /// Healthy primary workers, after a full health probe of every worker
    /// (primary and standby) unless dispatch-time probing is switched off.
    pub async fn candidates(&self) -> Vec<Arc<Worker>> {
        if self.probe_on_dispatch {
            self.health.check_all().await;
        }
        self.pool.healthy_primary()
    }

    /// Pick one worker out of `healthy` with the configured policy and open a
    /// connection on it. The pick and the increment happen under one lock.
    pub async fn select(&self, healthy: &[Arc<Worker>]) -> LbResult<ConnectionGuard> {
        let (_, lb) = self.policy()?;
        if healthy.is_empty() {
            return Err(LbError::NoHealthyBackend);
        }

        if lb.needs_fresh_load() {
            self.collector.refresh_loads(healthy).await?;
        }

        let _pick = self.pick.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        lb.next_server(healthy)
            .map(|worker| worker.acquire())
            .ok_or(LbError::NoHealthyBackend)
    }

    /// Route one request: probe, select, forward, record.
    pub async fn dispatch(&self, data: serde_json::Value) -> LbResult<Dispatched> {
        let (algorithm, _) = self.policy()?;

        let healthy = self.candidates().await;
        let guard = self.select(&healthy).await?;
        let selected = guard.worker().clone();
        tracing::debug!(worker = %selected.id, algorithm = %algorithm, "Selected worker");

        let request = ProcessRequest {
            data,
            algorithm: algorithm.name().to_string(),
        };

        let start = Instant::now();
        let result = match time::timeout(self.dispatch_timeout, self.client.process(&guard.id, request)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.dispatch_timeout)),
        };
        let elapsed = start.elapsed();
        drop(guard);

        match result {
            Ok(response) => {
                selected.record_latency(elapsed);
                tracing::info!(
                    worker = %selected.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Request processed"
                );
                Ok(Dispatched {
                    worker: selected.id.clone(),
                    response,
                    elapsed,
                })
            }
            Err(source) => {
                tracing::error!(worker = %selected.id, error = %source, "Error processing request");
                Err(LbError::Dispatch {
                    worker: selected.id.clone(),
                    source,
                })
            }
        }
    }
}
