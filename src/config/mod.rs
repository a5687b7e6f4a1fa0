//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, or flat config.json)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LbConfig (validated, immutable)
//!     → read once at startup by every subsystem
//!
//! Any failure along the way:
//!     → logged
//!     → LbConfig::default()
//! ```
//!
//! # Design Decisions
//! - Config is static; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AutoscaleConfig;
pub use schema::BalancerConfig;
pub use schema::HealthCheckConfig;
pub use schema::LbConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TimeoutConfig;
pub use schema::WorkersConfig;
