//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, intervals, pool floor)
//! - Check worker addresses parse and appear only once
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LbConfig → Result<(), Vec<ValidationError>>
//! - The algorithm name is not checked here; an unknown name is reported per
//!   request instead

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::LbConfig;
use crate::load_balancer::backend::WorkerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("{field} must be between 0 and 100, got {value}")]
    ThresholdRange { field: &'static str, value: u8 },

    #[error("low_usage_threshold ({low}) must be below high_usage_threshold ({high})")]
    ThresholdOrder { low: u8, high: u8 },

    #[error("min_primary_servers must be at least 1")]
    ZeroFloor,

    #[error("min_primary_servers ({min}) exceeds the {primary} configured primary workers")]
    FloorAbovePrimary { min: usize, primary: usize },

    #[error("{0}")]
    WorkerAddress(String),

    #[error("worker {0} is listed more than once")]
    DuplicateWorker(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &LbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let scale = &config.autoscale;
    for (field, value) in [
        ("high_usage_threshold", scale.high_usage_threshold),
        ("low_usage_threshold", scale.low_usage_threshold),
    ] {
        if value > 100 {
            errors.push(ValidationError::ThresholdRange { field, value });
        }
    }
    if scale.low_usage_threshold >= scale.high_usage_threshold {
        errors.push(ValidationError::ThresholdOrder {
            low: scale.low_usage_threshold,
            high: scale.high_usage_threshold,
        });
    }

    if scale.min_primary_servers == 0 {
        errors.push(ValidationError::ZeroFloor);
    } else if scale.min_primary_servers > config.workers.primary.len() {
        errors.push(ValidationError::FloorAbovePrimary {
            min: scale.min_primary_servers,
            primary: config.workers.primary.len(),
        });
    }

    let mut seen = HashSet::new();
    for address in config.workers.primary.iter().chain(&config.workers.standby) {
        match WorkerId::parse(address) {
            Ok(id) => {
                if !seen.insert(id.clone()) {
                    errors.push(ValidationError::DuplicateWorker(id.to_string()));
                }
            }
            Err(e) => errors.push(ValidationError::WorkerAddress(e.to_string())),
        }
    }

    for (field, value) in [
        ("autoscale.interval_ms", scale.interval_ms),
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("timeouts.probe_ms", config.timeouts.probe_ms),
        ("timeouts.dispatch_secs", config.timeouts.dispatch_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&LbConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = LbConfig::default();
        config.autoscale.high_usage_threshold = 120;
        config.autoscale.low_usage_threshold = 30;
        config.autoscale.min_primary_servers = 9;
        config.timeouts.probe_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ThresholdRange {
            field: "high_usage_threshold",
            value: 120
        }));
        assert!(errors.contains(&ValidationError::FloorAbovePrimary { min: 9, primary: 5 }));
        assert!(errors.contains(&ValidationError::Zero("timeouts.probe_ms")));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_threshold_order() {
        let mut config = LbConfig::default();
        config.autoscale.low_usage_threshold = 80;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ThresholdOrder { low: 80, high: 75 }]);
    }

    #[test]
    fn test_zero_floor() {
        let mut config = LbConfig::default();
        config.autoscale.min_primary_servers = 0;
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::ZeroFloor]);
    }

    #[test]
    fn test_duplicate_and_bad_workers() {
        let mut config = LbConfig::default();
        config.workers.standby = vec!["http://localhost:8001/".into(), "localhost:9000".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            ValidationError::DuplicateWorker("http://localhost:8001".into())
        );
        assert!(matches!(errors[1], ValidationError::WorkerAddress(_)));
    }

    #[test]
    fn test_unknown_algorithm_is_not_a_validation_error() {
        let mut config = LbConfig::default();
        config.balancer.algorithm = "Fastest".into();
        assert!(validate_config(&config).is_ok());
    }
}
