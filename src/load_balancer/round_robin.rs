//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Worker, LoadBalancer};

/// Round-robin selector.
///
/// The counter is taken modulo the number of candidates at selection time
/// and is never reset, so when the healthy set changes size the next pick
/// can skip or repeat a worker.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>> {
        if workers.is_empty() {
            return None;
        }

        let cursor = self.counter.fetch_add(1, Ordering::Relaxed);
        workers.get(cursor % workers.len()).cloned()
    }
}
