//! Shared utilities for integration tests: controllable mock workers and a
//! balancer running on an ephemeral port.
#![allow(dead_code)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use elastic_lb::config::LbConfig;
use elastic_lb::{HttpServer, Shutdown};

/// Knobs a test can turn on a running mock worker.
#[derive(Debug)]
pub struct MockState {
    pub healthy: AtomicBool,
    pub cpu: AtomicU8,
    pub rps: AtomicU64,
    pub fail_process: AtomicBool,
    pub delay_ms: AtomicU64,
    pub processed: AtomicUsize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            cpu: AtomicU8::new(50),
            rps: AtomicU64::new(0),
            fail_process: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            processed: AtomicUsize::new(0),
        }
    }
}

pub struct MockWorker {
    pub addr: SocketAddr,
    pub url: String,
    pub state: Arc<MockState>,
}

impl MockWorker {
    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_cpu(&self, usage: u8) {
        self.state.cpu.store(usage, Ordering::SeqCst);
    }

    pub fn set_rps(&self, rps: u64) {
        self.state.rps.store(rps, Ordering::SeqCst);
    }

    pub fn set_fail_process(&self, fail: bool) {
        self.state.fail_process.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn processed(&self) -> usize {
        self.state.processed.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct WorkerCtx {
    url: String,
    state: Arc<MockState>,
}

/// Start a mock worker on `127.0.0.1:0`.
pub async fn spawn_worker() -> MockWorker {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);
    let state = Arc::new(MockState::default());

    let ctx = WorkerCtx {
        url: url.clone(),
        state: state.clone(),
    };
    let app = Router::new()
        .route("/health", get(worker_health))
        .route("/cpuUsage", get(worker_cpu))
        .route("/requestsPerSecond", get(worker_rps))
        .route("/processRequest", post(worker_process))
        .with_state(ctx);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockWorker { addr, url, state }
}

pub async fn spawn_workers(n: usize) -> Vec<MockWorker> {
    let mut workers = Vec::with_capacity(n);
    for _ in 0..n {
        workers.push(spawn_worker().await);
    }
    workers
}

async fn worker_health(State(ctx): State<WorkerCtx>) -> Response {
    if ctx.state.healthy.load(Ordering::SeqCst) {
        Json(json!({ "status": "Healthy" })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "Unhealthy" })),
        )
            .into_response()
    }
}

async fn worker_cpu(State(ctx): State<WorkerCtx>) -> Json<Value> {
    Json(json!({ "usage": ctx.state.cpu.load(Ordering::SeqCst) }))
}

async fn worker_rps(State(ctx): State<WorkerCtx>) -> Json<Value> {
    Json(json!({ "requestsPerSecond": ctx.state.rps.load(Ordering::SeqCst) }))
}

async fn worker_process(
    State(ctx): State<WorkerCtx>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let delay = ctx.state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if ctx.state.fail_process.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Internal Server Error" })),
        )
            .into_response();
    }

    let Ok(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "No data provided" })))
            .into_response();
    };

    ctx.state.processed.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "message": format!("Processed request with data: {}", body["data"]),
        "server": ctx.url,
        "algorithm": body["algorithm"],
    }))
    .into_response()
}

/// Config pointing at the given workers, with both background loops off.
pub fn config_for(primary: &[MockWorker], standby: &[MockWorker]) -> LbConfig {
    let mut config = LbConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.workers.primary = primary.iter().map(|w| w.url.clone()).collect();
    config.workers.standby = standby.iter().map(|w| w.url.clone()).collect();
    config.health_check.enabled = false;
    config.autoscale.enabled = false;
    config.autoscale.min_primary_servers = 1;
    config.timeouts.probe_ms = 500;
    config.timeouts.dispatch_secs = 5;
    config.observability.metrics_enabled = false;
    config
}

pub struct Balancer {
    pub url: String,
    pub shutdown: Shutdown,
}

impl Balancer {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

/// Start a balancer on an ephemeral port.
pub async fn spawn_balancer(config: LbConfig) -> Balancer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    Balancer {
        url: format!("http://{}", addr),
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// `POST /sendRequest` and return status plus JSON body.
pub async fn send(client: &reqwest::Client, lb: &Balancer, body: Value) -> (u16, Value) {
    let res = client
        .post(lb.endpoint("/sendRequest"))
        .json(&body)
        .send()
        .await
        .expect("balancer unreachable");
    let status = res.status().as_u16();
    let json = res.json().await.unwrap_or(Value::Null);
    (status, json)
}
