//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the load
//! balancer. All types derive Serde traits for deserialization from config
//! files, and every section has defaults so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LbConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Selection policy settings.
    pub balancer: BalancerConfig,

    /// Worker addresses per pool.
    pub workers: WorkersConfig,

    /// Background health check settings.
    pub health_check: HealthCheckConfig,

    /// Autoscaling thresholds and loop interval.
    pub autoscale: AutoscaleConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4001".to_string(),
        }
    }
}

/// Selection policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// One of "Round Robin", "Least Connections", "Least Response Time",
    /// "Dynamic". Kept as a string: an unknown name rejects requests instead
    /// of failing startup.
    pub algorithm: String,

    /// Probe every worker before each dispatch.
    pub probe_on_dispatch: bool,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            algorithm: "Round Robin".to_string(),
            probe_on_dispatch: true,
        }
    }
}

/// Worker addresses. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Initially active workers, in round-robin order.
    pub primary: Vec<String>,

    /// Initially idle workers; the last one is promoted first.
    pub standby: Vec<String>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            primary: (8001..=8005).map(|port| format!("http://localhost:{port}")).collect(),
            standby: (8006..=8007).map(|port| format!("http://localhost:{port}")).collect(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health check loop.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

/// Autoscaling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoscaleConfig {
    /// Enable the autoscaling loop.
    pub enabled: bool,

    /// Control loop interval in milliseconds.
    pub interval_ms: u64,

    /// CPU percentage above which a standby worker is promoted.
    pub high_usage_threshold: u8,

    /// CPU percentage below which a primary worker is demoted.
    pub low_usage_threshold: u8,

    /// The primary pool never shrinks below this size.
    pub min_primary_servers: usize,
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 500,
            high_usage_threshold: 75,
            low_usage_threshold: 25,
            min_primary_servers: 4,
        }
    }
}

/// Timeout configuration for outbound and inbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Health probe and metric poll timeout in milliseconds.
    pub probe_ms: u64,

    /// Timeout for forwarding a request to a worker, in seconds.
    pub dispatch_secs: u64,

    /// Total time allowed for an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_ms: 2000,
            dispatch_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// The flat `config.json` format: a handful of top-level keys overlaid on
/// the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOverrides {
    pub algorithm: Option<String>,
    pub high_usage_threshold: Option<u8>,
    pub low_usage_threshold: Option<u8>,
    pub min_primary_servers: Option<usize>,
}

impl JsonOverrides {
    pub fn apply(self, config: &mut LbConfig) {
        if let Some(algorithm) = self.algorithm {
            config.balancer.algorithm = algorithm;
        }
        if let Some(high) = self.high_usage_threshold {
            config.autoscale.high_usage_threshold = high;
        }
        if let Some(low) = self.low_usage_threshold {
            config.autoscale.low_usage_threshold = low;
        }
        if let Some(min) = self.min_primary_servers {
            config.autoscale.min_primary_servers = min;
        }
    }
}
