//! Worker health state.
//!
//! # States
//! - Unknown: never probed; routable until the first probe says otherwise
//! - Healthy: last probe succeeded
//! - Unhealthy: last probe failed; excluded from selection
//!
//! # State Transitions
//! ```text
//! Unknown   → Healthy | Unhealthy : first probe
//! Healthy  ←→ Unhealthy           : every probe overwrites (last write wins)
//! ```
//!
//! Health is independent of pool membership: an unhealthy primary worker
//! stays primary until the autoscaler demotes it.

use serde::Serialize;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}
