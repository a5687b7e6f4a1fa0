//! Serializable metric views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::load_balancer::backend::WorkerId;

/// Body of `GET /metrics`: CPU usage and current connection count for every
/// primary worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub cpu_usages: BTreeMap<WorkerId, u8>,
    pub request_counts: BTreeMap<WorkerId, usize>,
}

/// Request rate of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRate {
    pub server: WorkerId,
    pub requests_per_second: f64,
}

/// Body of `GET /requestsData`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsData {
    pub request_counts: Vec<RequestRate>,
}
