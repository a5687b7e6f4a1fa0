//! Worker abstraction.
//!
//! # Responsibilities
//! - Represent a single backend worker and its stable identity
//! - Track active connections (for Least Connections / Dynamic)
//! - Track last observed latency and CPU load
//! - Track health state (Unknown/Healthy/Unhealthy)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use crate::health::state::HealthState;

/// A worker address that is not an absolute http(s) URL.
#[derive(Debug, Error)]
#[error("invalid worker address '{address}': {reason}")]
pub struct InvalidAddress {
    pub address: String,
    pub reason: String,
}

/// Stable identity of a worker: its base URL without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Parse and normalize a worker address such as `http://localhost:8001`.
    pub fn parse(address: &str) -> Result<Self, InvalidAddress> {
        let invalid = |reason: String| InvalidAddress {
            address: address.to_string(),
            reason,
        };
        let url = Url::parse(address.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(Self(url.as_str().trim_end_matches('/').to_string()))
    }

    /// Full URL of an endpoint on this worker, e.g. `endpoint("/health")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single backend worker.
///
/// Workers are created once at startup and shared as `Arc<Worker>` between the
/// pool, the routing engine and the background loops. Pool membership is not
/// stored here; see [`crate::load_balancer::pool::WorkerPool`].
#[derive(Debug)]
pub struct Worker {
    /// The identity (base URL) of the worker.
    pub id: WorkerId,
    /// Number of requests currently dispatched to this worker.
    active_connections: AtomicUsize,
    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Last observed dispatch latency in microseconds.
    latency_micros: AtomicU64,
    /// Last observed CPU load percentage.
    load: AtomicU8,
}

impl Worker {
    /// Create a new worker with zeroed counters and unknown health.
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            active_connections: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            latency_micros: AtomicU64::new(0),
            load: AtomicU8::new(0),
        }
    }

    /// Get the current number of active connections.
    pub fn connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Increment active connection count and return a guard that undoes it.
    pub fn acquire(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            worker: self.clone(),
        }
    }

    fn release(&self) {
        // Never wraps below zero even if a guard is somehow dropped twice.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Last observed response latency.
    pub fn latency(&self) -> Duration {
        Duration::from_micros(self.latency_micros.load(Ordering::Relaxed))
    }

    pub fn record_latency(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.store(micros, Ordering::Relaxed);
    }

    /// Last observed CPU load (0-100).
    pub fn load(&self) -> u8 {
        self.load.load(Ordering::Relaxed)
    }

    pub fn record_load(&self, usage: u8) {
        self.load.store(usage.min(100), Ordering::Relaxed);
    }

    // --- Health Logic ---

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Store the result of the latest probe. Returns true if the state changed.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        let next = if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };
        self.state.swap(next as u8, Ordering::Relaxed) != next as u8
    }

    /// Return true if the worker may receive traffic (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }
}

/// A RAII guard that holds one active connection on a worker.
#[derive(Debug)]
pub struct ConnectionGuard {
    worker: Arc<Worker>,
}

impl ConnectionGuard {
    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }
}

impl Deref for ConnectionGuard {
    type Target = Worker;
    fn deref(&self) -> &Self::Target {
        &self.worker
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.worker.release();
    }
}
