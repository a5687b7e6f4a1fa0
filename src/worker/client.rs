//! Worker client trait and its HTTP implementation.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::load_balancer::backend::WorkerId;

/// Errors from a single call to a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The call did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The worker could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The worker answered with a non-success status.
    #[error("worker returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The worker answered 2xx but the body was not what we expected.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The worker answered its health endpoint with something other than "Healthy".
    #[error("worker reported status '{0}'")]
    NotHealthy(String),
}

/// Deadlines are enforced by the callers, so a timeout reported by reqwest
/// itself can only be the connect timeout and counts as a failed connection.
impl From<reqwest::Error> for WorkerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            WorkerError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            WorkerError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            WorkerError::Connect(e.to_string())
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of `GET /cpuUsage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuUsageResponse {
    pub usage: f64,
}

/// Body of `GET /requestsPerSecond`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRateResponse {
    pub requests_per_second: f64,
}

/// Body of `POST /processRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub data: serde_json::Value,
    pub algorithm: String,
}

/// Capabilities the balancer needs from a worker.
///
/// Methods return boxed futures so the client can live behind
/// `Arc<dyn WorkerClient>`. Implementations do not need to enforce deadlines;
/// callers wrap every call in `tokio::time::timeout`.
pub trait WorkerClient: Send + Sync {
    /// Liveness check. `Ok(())` means the worker reported itself healthy.
    fn health<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<(), WorkerError>>;

    /// Current CPU utilization percentage (0-100).
    fn cpu_usage<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<u8, WorkerError>>;

    /// Current request throughput.
    fn requests_per_second<'a>(
        &'a self,
        worker: &'a WorkerId,
    ) -> BoxFuture<'a, Result<f64, WorkerError>>;

    /// Forward a request payload for processing and return the worker's answer.
    fn process<'a>(
        &'a self,
        worker: &'a WorkerId,
        request: ProcessRequest,
    ) -> BoxFuture<'a, Result<serde_json::Value, WorkerError>>;
}

/// Worker client over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: reqwest::Client,
}

impl HttpWorkerClient {
    /// Build a client. `connect_timeout` bounds TCP connection setup only;
    /// per-call deadlines are applied by the callers.
    pub fn new(connect_timeout: Duration) -> Result<Self, WorkerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("elastic-lb/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        worker: &WorkerId,
        path: &str,
    ) -> Result<T, WorkerError> {
        let response = self.client.get(worker.endpoint(path)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turn a non-2xx response into [`WorkerError::Status`], keeping the worker's
/// `message` field (or raw body) as the description.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WorkerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(WorkerError::Status {
        status: status.as_u16(),
        message,
    })
}

impl WorkerClient for HttpWorkerClient {
    fn health<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<(), WorkerError>> {
        async move {
            let body: HealthResponse = self.get_json(worker, "/health").await?;
            if body.status == "Healthy" {
                Ok(())
            } else {
                Err(WorkerError::NotHealthy(body.status))
            }
        }
        .boxed()
    }

    fn cpu_usage<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<u8, WorkerError>> {
        async move {
            let body: CpuUsageResponse = self.get_json(worker, "/cpuUsage").await?;
            if !body.usage.is_finite() {
                return Err(WorkerError::Decode(format!("usage {} is not a number", body.usage)));
            }
            Ok(body.usage.round().clamp(0.0, 100.0) as u8)
        }
        .boxed()
    }

    fn requests_per_second<'a>(
        &'a self,
        worker: &'a WorkerId,
    ) -> BoxFuture<'a, Result<f64, WorkerError>> {
        async move {
            let body: RequestRateResponse = self.get_json(worker, "/requestsPerSecond").await?;
            Ok(body.requests_per_second)
        }
        .boxed()
    }

    fn process<'a>(
        &'a self,
        worker: &'a WorkerId,
        request: ProcessRequest,
    ) -> BoxFuture<'a, Result<serde_json::Value, WorkerError>> {
        async move {
            let response = self
                .client
                .post(worker.endpoint("/processRequest"))
                .json(&request)
                .send()
                .await?;
            let response = check_status(response).await?;
            Ok(response.json::<serde_json::Value>().await?)
        }
        .boxed()
    }
}
