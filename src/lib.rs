//! Elastic load balancer library.
//!
//! Routes `sendRequest` calls across a primary pool of workers with one of
//! four selection policies, and grows or shrinks that pool from a standby
//! stack based on polled CPU load.

pub mod autoscale;
pub mod collector;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod worker;

pub use config::schema::LbConfig;
pub use error::{LbError, LbResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
