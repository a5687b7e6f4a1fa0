//! Autoscaling control loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::collector::MetricsCollector;
use crate::config::AutoscaleConfig;
use crate::load_balancer::backend::WorkerId;
use crate::load_balancer::pool::{DemoteError, WorkerPool};
use crate::observability::metrics;

/// What one control cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Worker moved from standby to primary, if any.
    pub promoted: Option<WorkerId>,
    /// Workers moved from primary to standby, in the order they were demoted.
    pub demoted: Vec<WorkerId>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.promoted.is_none() && self.demoted.is_empty()
    }
}

pub struct AutoscaleController {
    pool: Arc<WorkerPool>,
    collector: Arc<MetricsCollector>,
    config: AutoscaleConfig,
}

impl AutoscaleController {
    pub fn new(pool: Arc<WorkerPool>, collector: Arc<MetricsCollector>, config: AutoscaleConfig) -> Self {
        Self {
            pool,
            collector,
            config,
        }
    }

    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Autoscaling disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            high = self.config.high_usage_threshold,
            low = self.config.low_usage_threshold,
            min_primary = self.pool.min_primary(),
            "Autoscaler starting"
        );

        let mut ticker = time::interval(Duration::from_millis(self.config.interval_ms));
        // A slow cycle must not be followed by a burst of catch-up cycles.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Autoscaler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Sample every primary worker once and apply the scaling rules in pool
    /// order: the first worker above the high threshold promotes one standby
    /// worker, and each worker below the low threshold is demoted as it is
    /// reached, against the pool size at that moment.
    pub async fn run_cycle(&self) -> CycleReport {
        let loads = self.collector.primary_loads().await;
        let mut report = CycleReport::default();
        let mut promoted = false;

        for (worker, load) in &loads {
            if *load > self.config.high_usage_threshold {
                if promoted {
                    continue;
                }
                promoted = true;
                tracing::info!(worker = %worker.id, load, "High usage detected, scaling up");
                report.promoted = self.scale_up();
            } else if *load < self.config.low_usage_threshold {
                tracing::debug!(worker = %worker.id, load, "Low usage detected");
                if self.scale_down(&worker.id) {
                    report.demoted.push(worker.id.clone());
                }
            }
        }

        let (primary, standby) = self.pool.sizes();
        metrics::record_pool_sizes(primary, standby);
        if !report.is_empty() {
            tracing::info!(
                promoted = ?report.promoted,
                demoted = ?report.demoted,
                primary,
                standby,
                "Pool resized"
            );
        }

        report
    }

    fn scale_up(&self) -> Option<WorkerId> {
        match self.pool.promote() {
            Some(worker) => {
                tracing::info!(worker = %worker.id, "Scaled up: moved worker to primary");
                metrics::record_scale_event("up");
                Some(worker.id.clone())
            }
            None => {
                tracing::info!("No available standby workers to add");
                None
            }
        }
    }

    fn scale_down(&self, id: &WorkerId) -> bool {
        match self.pool.demote(id) {
            Ok(worker) => {
                tracing::info!(worker = %worker.id, "Scaled down: moved worker to standby");
                metrics::record_scale_event("down");
                true
            }
            Err(DemoteError::AtFloor(min)) => {
                tracing::debug!(worker = %id, min, "Cannot scale down, minimum primary workers reached");
                false
            }
            Err(e @ DemoteError::NotPrimary(_)) => {
                tracing::debug!(error = %e, "Skipping scale down");
                false
            }
        }
    }
}
