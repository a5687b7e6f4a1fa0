//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Instant;

use crate::collector::{MetricsSnapshot, RequestsData};
use crate::error::LbError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::load_balancer::engine::Dispatched;
use crate::load_balancer::pool::PoolView;
use crate::observability::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct SendRequestBody {
    #[serde(default)]
    pub data: Option<Value>,
}

/// `POST /sendRequest`
pub async fn send_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SendRequestBody>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let result = match (state.engine.algorithm(), body) {
        (Err(e), _) => Err(LbError::from(e)),
        (Ok(_), Ok(Json(SendRequestBody { data: Some(data) }))) if !data.is_null() => {
            state.engine.dispatch(data).await
        }
        (Ok(_), Ok(_)) => Err(LbError::MissingData),
        (Ok(_), Err(rejection)) => {
            tracing::debug!(request_id, error = %rejection, "Unreadable request body");
            Err(LbError::MissingData)
        }
    };

    match result {
        Ok(done) => {
            metrics::record_request(200, done.worker.as_str(), start);
            (StatusCode::OK, Json(success_body(done))).into_response()
        }
        Err(e) => {
            let worker = e.selected_server().map_or("none", |w| w.as_str());
            metrics::record_request(e.status_code().as_u16(), worker, start);
            tracing::warn!(request_id, error = %e, "sendRequest failed");
            e.into_response()
        }
    }
}

/// The worker's JSON object with `selectedServer` added. A non-object result
/// is wrapped under `result`.
fn success_body(done: Dispatched) -> Value {
    let mut body = match done.response {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };
    body.insert(
        "selectedServer".to_string(),
        Value::String(done.worker.to_string()),
    );
    Value::Object(body)
}

/// `GET /requestsData`
pub async fn requests_data(State(state): State<AppState>) -> Json<RequestsData> {
    Json(state.collector.request_rates().await)
}

/// `GET /metrics`
pub async fn metrics_snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.collector.snapshot().await)
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "Healthy" }))
}

/// `GET /pool`
pub async fn pool(State(state): State<AppState>) -> Json<PoolView> {
    Json(state.pool.view())
}
