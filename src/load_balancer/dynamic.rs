//! Dynamic (weighted score) load balancing strategy.
//!
//! ```text
//! score = load / 100 + connections / 10 + latency_ms / 1000
//! ```
//!
//! The lowest score wins. The engine refreshes every candidate's CPU load
//! right before selection, so `load` is never older than the request.

use std::sync::Arc;

use crate::load_balancer::{backend::Worker, LoadBalancer};

#[derive(Debug, Default)]
pub struct Dynamic;

impl Dynamic {
    pub fn new() -> Self {
        Self
    }

    pub fn score(worker: &Worker) -> f64 {
        let latency_ms = worker.latency().as_secs_f64() * 1000.0;
        f64::from(worker.load()) / 100.0 + worker.connections() as f64 / 10.0 + latency_ms / 1000.0
    }
}

impl LoadBalancer for Dynamic {
    fn next_server(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>> {
        let mut best: Option<(&Arc<Worker>, f64)> = None;
        for worker in workers {
            let score = Self::score(worker);
            // Strictly lower only: equal scores keep the earlier worker.
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((worker, score));
            }
        }
        best.map(|(w, _)| w.clone())
    }

    fn needs_fresh_load(&self) -> bool {
        true
    }
}
