//! Error responses.
//!
//! # Status Mapping
//! - Unknown algorithm, missing data → 400
//! - No healthy primary worker → 503
//! - Failed load sample, failed dispatch → 500
//!
//! Bodies carry a stable `message`; the underlying cause goes in `error` and
//! the chosen worker, when there was one, in `selectedServer`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::LbError;
use crate::load_balancer::backend::WorkerId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_server: Option<WorkerId>,
}

impl LbError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LbError::InvalidAlgorithm(_) | LbError::MissingData => StatusCode::BAD_REQUEST,
            LbError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            LbError::Scoring(_) | LbError::Dispatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The worker the request was sent to, if it got that far.
    pub fn selected_server(&self) -> Option<&WorkerId> {
        match self {
            LbError::Dispatch { worker, .. } => Some(worker),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            LbError::InvalidAlgorithm(e) => ErrorBody {
                message: "Invalid algorithm specified",
                error: Some(e.to_string()),
                selected_server: None,
            },
            LbError::MissingData => ErrorBody {
                message: "No data provided",
                error: None,
                selected_server: None,
            },
            LbError::NoHealthyBackend => ErrorBody {
                message: "No healthy servers available",
                error: None,
                selected_server: None,
            },
            LbError::Scoring(e) => ErrorBody {
                message: "Error calculating dynamic algorithm",
                error: Some(e.to_string()),
                selected_server: None,
            },
            LbError::Dispatch { worker, source } => ErrorBody {
                message: "Error processing request",
                error: Some(source.to_string()),
                selected_server: Some(worker.clone()),
            },
        }
    }
}

impl IntoResponse for LbError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::UnknownAlgorithm;
    use crate::worker::WorkerError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LbError::InvalidAlgorithm(UnknownAlgorithm("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LbError::MissingData.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            LbError::NoHealthyBackend.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_dispatch_body_names_worker() {
        let worker = WorkerId::parse("http://localhost:8003").unwrap();
        let err = LbError::Dispatch {
            worker: worker.clone(),
            source: WorkerError::Status {
                status: 400,
                message: "No data provided".into(),
            },
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.selected_server(), Some(&worker));

        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["message"], "Error processing request");
        assert_eq!(json["selectedServer"], "http://localhost:8003");
        assert!(json["error"].as_str().unwrap().contains("No data provided"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(LbError::NoHealthyBackend.body()).unwrap();
        assert_eq!(json, serde_json::json!({"message": "No healthy servers available"}));
    }
}
