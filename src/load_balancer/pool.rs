//! Worker pool management.
//!
//! # Responsibilities
//! - Own pool membership: ordered primary list, standby stack
//! - Enforce the minimum primary pool size on every demotion
//! - Hand out snapshots of the current membership to readers
//!
//! Membership changes only through [`WorkerPool::promote`] and
//! [`WorkerPool::demote`], so a worker is always in exactly one of the two
//! pools.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

use crate::config::WorkersConfig;
use crate::load_balancer::backend::{HealthState, InvalidAddress, Worker, WorkerId};

/// Why a demotion did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemoteError {
    #[error("worker {0} is not in the primary pool")]
    NotPrimary(WorkerId),

    #[error("primary pool is at its minimum size of {0}")]
    AtFloor(usize),
}

#[derive(Debug, Default)]
struct PoolState {
    primary: Vec<Arc<Worker>>,
    /// Used as a stack: last demoted is first promoted.
    standby: Vec<Arc<Worker>>,
}

/// Primary and standby pools behind a single lock.
#[derive(Debug)]
pub struct WorkerPool {
    state: Mutex<PoolState>,
    min_primary: usize,
}

impl WorkerPool {
    /// Create a pool from pre-built workers.
    pub fn new(primary: Vec<Arc<Worker>>, standby: Vec<Arc<Worker>>, min_primary: usize) -> Self {
        Self {
            state: Mutex::new(PoolState { primary, standby }),
            min_primary,
        }
    }

    /// Create a pool from configuration.
    pub fn from_config(config: &WorkersConfig, min_primary: usize) -> Result<Self, InvalidAddress> {
        let build = |addrs: &[String]| -> Result<Vec<Arc<Worker>>, InvalidAddress> {
            addrs
                .iter()
                .map(|a| WorkerId::parse(a).map(|id| Arc::new(Worker::new(id))))
                .collect()
        };

        let primary = build(&config.primary)?;
        let standby = build(&config.standby)?;
        Ok(Self::new(primary, standby, min_primary))
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // The state is a pair of Vecs that is never left half-updated, so a
        // poisoned lock still holds consistent data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn min_primary(&self) -> usize {
        self.min_primary
    }

    /// Snapshot of the primary pool in order.
    pub fn primary(&self) -> Vec<Arc<Worker>> {
        self.lock().primary.clone()
    }

    /// Snapshot of the standby stack, bottom first.
    pub fn standby(&self) -> Vec<Arc<Worker>> {
        self.lock().standby.clone()
    }

    /// All workers: primary first, then standby.
    pub fn all(&self) -> Vec<Arc<Worker>> {
        let state = self.lock();
        state.primary.iter().chain(state.standby.iter()).cloned().collect()
    }

    /// Primary workers that may currently receive traffic, in pool order.
    pub fn healthy_primary(&self) -> Vec<Arc<Worker>> {
        self.lock()
            .primary
            .iter()
            .filter(|w| w.is_healthy())
            .cloned()
            .collect()
    }

    /// `(primary, standby)` sizes.
    pub fn sizes(&self) -> (usize, usize) {
        let state = self.lock();
        (state.primary.len(), state.standby.len())
    }

    /// Move the top of the standby stack to the tail of the primary pool.
    ///
    /// Returns `None` when standby is empty.
    pub fn promote(&self) -> Option<Arc<Worker>> {
        let mut state = self.lock();
        let worker = state.standby.pop()?;
        state.primary.push(worker.clone());
        Some(worker)
    }

    /// Move a specific primary worker onto the standby stack, unless that
    /// would shrink the primary pool below its minimum.
    pub fn demote(&self, id: &WorkerId) -> Result<Arc<Worker>, DemoteError> {
        let mut state = self.lock();
        let index = state
            .primary
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| DemoteError::NotPrimary(id.clone()))?;

        if state.primary.len() <= self.min_primary {
            return Err(DemoteError::AtFloor(self.min_primary));
        }

        let worker = state.primary.remove(index);
        state.standby.push(worker.clone());
        Ok(worker)
    }

    /// Serializable view of both pools.
    pub fn view(&self) -> PoolView {
        let state = self.lock();
        PoolView {
            primary: state.primary.iter().map(|w| WorkerView::from(w.as_ref())).collect(),
            standby: state.standby.iter().map(|w| WorkerView::from(w.as_ref())).collect(),
        }
    }
}

/// Snapshot of a worker's live state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerView {
    pub id: WorkerId,
    pub health: HealthState,
    pub connections: usize,
    pub latency_ms: u64,
    pub load: u8,
}

impl From<&Worker> for WorkerView {
    fn from(w: &Worker) -> Self {
        Self {
            id: w.id.clone(),
            health: w.health(),
            connections: w.connections(),
            latency_ms: duration_ms(w.latency()),
            load: w.load(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Snapshot of both pools.
#[derive(Debug, Clone, Serialize)]
pub struct PoolView {
    pub primary: Vec<WorkerView>,
    pub standby: Vec<WorkerView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::testing::workers;

    fn ids(ws: &[Arc<Worker>]) -> Vec<WorkerId> {
        ws.iter().map(|w| w.id.clone()).collect()
    }

    #[test]
    fn test_from_config() {
        let config = WorkersConfig {
            primary: vec!["http://localhost:8001".into(), "http://localhost:8002/".into()],
            standby: vec!["http://localhost:8006".into()],
        };
        let pool = WorkerPool::from_config(&config, 1).unwrap();
        assert_eq!(pool.sizes(), (2, 1));
        assert_eq!(pool.primary()[1].id.as_str(), "http://localhost:8002");
    }

    #[test]
    fn test_from_config_rejects_bad_address() {
        let config = WorkersConfig {
            primary: vec!["localhost".into()],
            standby: vec![],
        };
        assert!(WorkerPool::from_config(&config, 1).is_err());
    }

    #[test]
    fn test_standby_is_a_stack() {
        let ws = workers(4);
        let pool = WorkerPool::new(ws[..2].to_vec(), ws[2..].to_vec(), 1);

        let first = pool.promote().unwrap();
        assert_eq!(first.id, ws[3].id);
        assert_eq!(ids(&pool.primary()), ids(&[ws[0].clone(), ws[1].clone(), ws[3].clone()]));

        // Last demoted comes back first.
        pool.demote(&ws[0].id).unwrap();
        assert_eq!(pool.promote().unwrap().id, ws[0].id);
        assert_eq!(pool.promote().unwrap().id, ws[2].id);
        assert!(pool.promote().is_none());
        assert_eq!(pool.sizes(), (4, 0));
    }

    #[test]
    fn test_demote_respects_floor() {
        let ws = workers(3);
        let pool = WorkerPool::new(ws.clone(), vec![], 2);

        assert!(pool.demote(&ws[1].id).is_ok());
        assert_eq!(ids(&pool.primary()), ids(&[ws[0].clone(), ws[2].clone()]));

        assert_eq!(pool.demote(&ws[0].id).unwrap_err(), DemoteError::AtFloor(2));
        assert_eq!(pool.sizes(), (2, 1));
    }

    #[test]
    fn test_demote_unknown_worker() {
        let ws = workers(3);
        let pool = WorkerPool::new(ws[..2].to_vec(), ws[2..].to_vec(), 1);
        assert_eq!(
            pool.demote(&ws[2].id).unwrap_err(),
            DemoteError::NotPrimary(ws[2].id.clone())
        );
    }

    #[test]
    fn test_membership_is_exclusive() {
        let ws = workers(6);
        let pool = WorkerPool::new(ws[..4].to_vec(), ws[4..].to_vec(), 2);
        pool.promote();
        pool.demote(&ws[0].id).unwrap();
        pool.demote(&ws[1].id).unwrap();
        pool.promote();

        let mut all = ids(&pool.all());
        all.sort();
        let mut expected = ids(&ws);
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_healthy_primary_filters_unhealthy() {
        let ws = workers(3);
        ws[1].set_healthy(false);
        let pool = WorkerPool::new(ws.clone(), vec![], 1);
        assert_eq!(ids(&pool.healthy_primary()), ids(&[ws[0].clone(), ws[2].clone()]));
    }
}
