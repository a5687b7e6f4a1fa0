//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Worker, LoadBalancer};

/// Least connections selector.
/// Selects the worker with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>> {
        // `min_by_key` keeps the first of several equal minimums.
        workers.iter().min_by_key(|w| w.connections()).cloned()
    }
}
