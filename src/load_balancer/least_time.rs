//! Least Response Time load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Worker, LoadBalancer};

/// Picks the worker with the lowest last observed latency.
///
/// Latency starts at zero, so workers that have never served a request are
/// preferred until they report a sample.
#[derive(Debug, Default)]
pub struct LeastResponseTime;

impl LeastResponseTime {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastResponseTime {
    fn next_server(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>> {
        workers.iter().min_by_key(|w| w.latency()).cloned()
    }
}
