//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through request spans via `x-request-id`
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is
//!   installed, so tests never need to set one up

pub mod logging;
pub mod metrics;
