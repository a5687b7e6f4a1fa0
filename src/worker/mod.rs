//! Outbound calls to backend workers.
//!
//! Every call the balancer makes to a worker goes through the
//! [`WorkerClient`] trait: health probes, CPU and request-rate polls, and
//! request dispatch. The production implementation speaks HTTP/JSON via
//! `reqwest`; tests plug in in-memory stubs.
//!
//! # Worker Interface
//! ```text
//! GET  /health             → {"status": "Healthy"}
//! GET  /cpuUsage           → {"usage": 0..100}
//! GET  /requestsPerSecond  → {"requestsPerSecond": number}
//! POST /processRequest     {"data", "algorithm"} → result JSON
//! ```

pub mod client;

pub use client::{
    CpuUsageResponse, HealthResponse, HttpWorkerClient, ProcessRequest, RequestRateResponse,
    WorkerClient, WorkerError,
};
