//! Stand-in application server implementing the worker interface.
//!
//! `POST /processRequest` burns CPU for a random 300..800 ms on a blocking
//! thread, so `/cpuUsage` moves with the offered load the way a real worker's
//! would.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use rand::Rng;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mock-worker", about = "Simulated worker for the elastic load balancer")]
struct Args {
    #[arg(short, long, default_value_t = 8001)]
    port: u16,

    /// Shortest simulated processing time, in milliseconds
    #[arg(long, default_value_t = 300)]
    min_ms: u64,

    /// Longest simulated processing time, in milliseconds
    #[arg(long, default_value_t = 800)]
    max_ms: u64,
}

struct Sample {
    at: Instant,
    busy_micros: u64,
    completed: u64,
}

struct WorkerState {
    port: u16,
    work: (u64, u64),
    active: AtomicUsize,
    busy_micros: AtomicU64,
    completed: AtomicU64,
    last_cpu: Mutex<Sample>,
    last_rate: Mutex<Sample>,
}

impl WorkerState {
    fn sample(&self) -> Sample {
        Sample {
            at: Instant::now(),
            busy_micros: self.busy_micros.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
        }
    }
}

type Shared = Arc<WorkerState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let now = Instant::now();
    let state: Shared = Arc::new(WorkerState {
        port: args.port,
        work: (args.min_ms, args.max_ms.max(args.min_ms)),
        active: AtomicUsize::new(0),
        busy_micros: AtomicU64::new(0),
        completed: AtomicU64::new(0),
        last_cpu: Mutex::new(Sample { at: now, busy_micros: 0, completed: 0 }),
        last_rate: Mutex::new(Sample { at: now, busy_micros: 0, completed: 0 }),
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/cpuUsage", get(cpu_usage))
        .route("/requestsPerSecond", get(requests_per_second))
        .route("/activeConnections", get(active_connections))
        .route("/processRequest", post(process_request))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Application server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "Healthy" }))
}

/// Share of wall time spent processing since the previous poll.
async fn cpu_usage(State(state): State<Shared>) -> Json<Value> {
    let now = state.sample();
    let mut last = state.last_cpu.lock().unwrap_or_else(|p| p.into_inner());
    let wall = now.at.duration_since(last.at).as_micros() as f64;
    let busy = now.busy_micros.saturating_sub(last.busy_micros) as f64;
    *last = now;

    let usage = if wall > 0.0 { (busy / wall * 100.0).clamp(0.0, 100.0) } else { 0.0 };
    Json(json!({ "usage": usage.round() }))
}

async fn requests_per_second(State(state): State<Shared>) -> Json<Value> {
    let now = state.sample();
    let mut last = state.last_rate.lock().unwrap_or_else(|p| p.into_inner());
    let secs = now.at.duration_since(last.at).as_secs_f64();
    let done = now.completed.saturating_sub(last.completed) as f64;
    *last = now;

    let rate = if secs > 0.0 { done / secs } else { 0.0 };
    Json(json!({ "requestsPerSecond": rate }))
}

async fn active_connections(State(state): State<Shared>) -> Json<Value> {
    Json(json!({ "activeConnections": state.active.load(Ordering::Relaxed) }))
}

async fn process_request(State(state): State<Shared>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let data = match body.as_ref().ok().and_then(|Json(b)| b.get("data")) {
        Some(data) if !data.is_null() => data.clone(),
        _ => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "message": "No data provided" })))
                .into_response()
        }
    };

    let request_number = state.active.fetch_add(1, Ordering::Relaxed) + 1;
    let (min, max) = state.work;
    let worked = tokio::task::spawn_blocking(move || {
        let budget = Duration::from_millis(rand::thread_rng().gen_range(min..=max));
        let start = Instant::now();
        let mut rng = rand::thread_rng();
        while start.elapsed() < budget {
            std::hint::black_box(rng.gen::<u64>());
        }
        start.elapsed()
    })
    .await;
    state.active.fetch_sub(1, Ordering::Relaxed);

    match worked {
        Ok(elapsed) => {
            state.busy_micros.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
            state.completed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "Processed request");
            Json(json!({
                "message": format!("Processed request with data: {}, Server: {}", data, state.port),
                "server": format!("Server-{}", state.port),
                "requestNumber": request_number,
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Internal Server Error", "error": e.to_string() })),
        )
            .into_response(),
    }
}
