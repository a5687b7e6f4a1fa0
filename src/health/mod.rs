//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Background probing (active.rs):
//!     Periodic timer (30s default)
//!     → Probe every worker, primary and standby, concurrently
//!     → Update Worker health state (state.rs)
//!
//! Dispatch-time probing (active.rs, called by the routing engine):
//!     Inbound /sendRequest
//!     → Same full probe, awaited before selection
//!     → Selection sees a just-computed health snapshot
//! ```
//!
//! # Design Decisions
//! - A failing probe only ever affects its own worker
//! - Both probe paths write the same state; last write wins
//! - Health state is per-worker, not per-pool

pub mod active;
pub mod state;
