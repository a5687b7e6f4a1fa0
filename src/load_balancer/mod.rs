//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! POST /sendRequest
//!     → engine.rs (policy configured? probe health of every worker)
//!     → pool.rs (healthy primary workers, in pool order)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through healthy primaries)
//!         - least_conn.rs (fewest active connections)
//!         - least_time.rs (lowest last observed latency)
//!         - dynamic.rs (fresh CPU load + connections + latency score)
//!     → backend.rs (connection guard held for the dispatch)
//!     → Forward payload, record latency, release guard
//! ```
//!
//! # Design Decisions
//! - Policies only choose; the engine owns counters and dispatch
//! - Ties always go to the first worker in pool order
//! - Unhealthy workers are filtered out before a policy sees them

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub mod backend;
pub mod dynamic;
pub mod engine;
pub mod least_conn;
pub mod least_time;
pub mod pool;
pub mod round_robin;

#[cfg(test)]
pub(crate) mod testing;

use self::backend::Worker;

/// A worker selection policy.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// Pick one worker out of `workers`, or `None` if the slice is empty.
    fn next_server(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>>;

    /// Whether every candidate needs a fresh CPU load sample before
    /// `next_server` is called.
    fn needs_fresh_load(&self) -> bool {
        false
    }
}

/// The configurable selection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    RoundRobin,
    LeastConnections,
    LeastResponseTime,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown load balancing algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

impl Algorithm {
    /// Display name, also sent to workers with each request.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "Round Robin",
            Algorithm::LeastConnections => "Least Connections",
            Algorithm::LeastResponseTime => "Least Response Time",
            Algorithm::Dynamic => "Dynamic",
        }
    }

    pub fn build(self) -> Box<dyn LoadBalancer> {
        match self {
            Algorithm::RoundRobin => Box::new(round_robin::RoundRobin::new()),
            Algorithm::LeastConnections => Box::new(least_conn::LeastConnections::new()),
            Algorithm::LeastResponseTime => Box::new(least_time::LeastResponseTime::new()),
            Algorithm::Dynamic => Box::new(dynamic::Dynamic::new()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    /// Accepts display names ("Least Connections") as well as snake_case and
    /// kebab-case forms, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();

        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "round robin" => Ok(Algorithm::RoundRobin),
            "least connections" => Ok(Algorithm::LeastConnections),
            "least response time" => Ok(Algorithm::LeastResponseTime),
            "dynamic" => Ok(Algorithm::Dynamic),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!("Round Robin".parse::<Algorithm>(), Ok(Algorithm::RoundRobin));
        assert_eq!("least_connections".parse::<Algorithm>(), Ok(Algorithm::LeastConnections));
        assert_eq!("least-response-time".parse::<Algorithm>(), Ok(Algorithm::LeastResponseTime));
        assert_eq!(" DYNAMIC ".parse::<Algorithm>(), Ok(Algorithm::Dynamic));
        assert_eq!(
            "Weighted".parse::<Algorithm>(),
            Err(UnknownAlgorithm("Weighted".into()))
        );
    }

    #[test]
    fn test_name_round_trips() {
        for algo in [
            Algorithm::RoundRobin,
            Algorithm::LeastConnections,
            Algorithm::LeastResponseTime,
            Algorithm::Dynamic,
        ] {
            assert_eq!(algo.name().parse::<Algorithm>(), Ok(algo));
        }
    }
}
