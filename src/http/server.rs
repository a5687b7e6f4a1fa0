//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every subsystem from config (pool, health, collector, engine,
//!   autoscaler) and share them through [`AppState`]
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run the background loops next to the listener and stop them together

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::autoscale::AutoscaleController;
use crate::collector::MetricsCollector;
use crate::config::LbConfig;
use crate::health::active::HealthMonitor;
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::startup::StartupError;
use crate::load_balancer::engine::RoutingEngine;
use crate::load_balancer::pool::WorkerPool;
use crate::worker::{HttpWorkerClient, WorkerClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoutingEngine>,
    pub collector: Arc<MetricsCollector>,
    pub pool: Arc<WorkerPool>,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: LbConfig,
    state: AppState,
    health: Arc<HealthMonitor>,
    autoscaler: Arc<AutoscaleController>,
}

impl HttpServer {
    /// Create a server that talks to workers over HTTP.
    pub fn new(config: LbConfig) -> Result<Self, StartupError> {
        let probe_timeout = Duration::from_millis(config.timeouts.probe_ms);
        let client = HttpWorkerClient::new(probe_timeout)?;
        Self::with_client(config, Arc::new(client))
    }

    /// Create a server with a caller-supplied worker client.
    pub fn with_client(config: LbConfig, client: Arc<dyn WorkerClient>) -> Result<Self, StartupError> {
        let probe_timeout = Duration::from_millis(config.timeouts.probe_ms);

        let pool = Arc::new(WorkerPool::from_config(
            &config.workers,
            config.autoscale.min_primary_servers,
        )?);
        let health = Arc::new(HealthMonitor::new(
            pool.clone(),
            client.clone(),
            config.health_check.clone(),
            probe_timeout,
        ));
        let collector = Arc::new(MetricsCollector::new(pool.clone(), client.clone(), probe_timeout));
        let engine = Arc::new(RoutingEngine::new(
            pool.clone(),
            health.clone(),
            collector.clone(),
            client,
            &config,
        ));
        let autoscaler = Arc::new(AutoscaleController::new(
            pool.clone(),
            collector.clone(),
            config.autoscale.clone(),
        ));

        let (primary, standby) = pool.sizes();
        tracing::info!(primary, standby, "Worker pools initialized");

        let state = AppState {
            engine,
            collector,
            pool,
        };
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            config,
            state,
            health,
            autoscaler,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &LbConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/sendRequest", post(handlers::send_request))
            .route("/requestsData", get(handlers::requests_data))
            .route("/metrics", get(handlers::metrics_snapshot))
            .route("/health", get(handlers::health))
            .route("/pool", get(handlers::pool))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server and the background loops until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Load balancer listening");

        let health_task = tokio::spawn(self.health.clone().run(shutdown.resubscribe()));
        let autoscale_task = tokio::spawn(self.autoscaler.clone().run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        for task in [health_task, autoscale_task] {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Background task panicked");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LbConfig {
        &self.config
    }

    /// Shared state, as seen by the handlers.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
