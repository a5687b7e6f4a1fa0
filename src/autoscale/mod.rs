//! Autoscaling subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (500ms default)
//!     → collector (CPU load of every primary worker)
//!     → controller.rs, one pass in pool order:
//!         first load > high threshold → promote one standby worker
//!         each load < low threshold → demote that worker (floor permitting,
//!         counted at the moment it is reached)
//!     → pool membership updated, report logged and exported
//! ```
//!
//! # Design Decisions
//! - Membership and health are independent; the controller never looks at health
//! - Standby is a stack: the last worker demoted is the first promoted
//! - The primary pool never shrinks below `min_primary_servers`

pub mod controller;

pub use controller::{AutoscaleController, CycleReport};
