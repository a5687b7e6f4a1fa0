//! Request-path errors.

use thiserror::Error;

use crate::collector::SampleError;
use crate::load_balancer::backend::WorkerId;
use crate::load_balancer::UnknownAlgorithm;
use crate::worker::WorkerError;

/// Errors that end a `sendRequest` call. Mapped to HTTP status codes in
/// [`crate::http::response`].
#[derive(Debug, Error)]
pub enum LbError {
    /// The configured algorithm name is not one we know.
    #[error("Invalid algorithm specified ({0})")]
    InvalidAlgorithm(#[from] UnknownAlgorithm),

    /// The request body carried no `data`.
    #[error("No data provided")]
    MissingData,

    /// No primary worker passed its health check.
    #[error("No healthy servers available")]
    NoHealthyBackend,

    /// A fresh load sample needed by Dynamic selection failed.
    #[error("Error calculating dynamic algorithm: {0}")]
    Scoring(#[from] SampleError),

    /// The selected worker failed to process the request.
    #[error("Error processing request on {worker}: {source}")]
    Dispatch {
        worker: WorkerId,
        #[source]
        source: WorkerError,
    },
}

/// Result type for request-path operations.
pub type LbResult<T> = Result<T, LbError>;
