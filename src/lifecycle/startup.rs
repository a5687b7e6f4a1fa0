//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn the loaded config into a listening socket
//! - Report anything that stops the process from starting
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::load_balancer::backend::InvalidAddress;
use crate::worker::WorkerError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid listen address '{0}'")]
    ListenAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Worker(#[from] InvalidAddress),

    #[error("failed to build worker client: {0}")]
    Client(#[from] WorkerError),
}

/// Bind the listener for `bind_address`.
pub async fn bind(bind_address: &str) -> Result<TcpListener, StartupError> {
    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|_| StartupError::ListenAddress(bind_address.to_string()))?;

    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })
}
