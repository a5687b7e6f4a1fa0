//! Load signal collection.
//!
//! # Data Flow
//! ```text
//! Autoscaler tick / Dynamic selection / GET /metrics / GET /requestsData
//!     → sampler.rs (poll primary workers concurrently, per-call timeout)
//!     → Worker.record_load (last observed CPU load)
//!     → snapshot.rs (serializable views for the HTTP surface)
//! ```
//!
//! # Design Decisions
//! - Only the primary pool is polled; standby workers carry no traffic
//! - Fail open: a failed poll reads as 0 instead of an error
//! - Dynamic selection is the exception and needs every sample to succeed

pub mod sampler;
pub mod snapshot;

pub use sampler::{MetricsCollector, SampleError};
pub use snapshot::{MetricsSnapshot, RequestRate, RequestsData};
