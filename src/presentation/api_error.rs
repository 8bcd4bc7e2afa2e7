// HTTP mapping of the tracker error taxonomy
use crate::application::errors::TrackerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

impl TrackerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::Auth(_) | TrackerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TrackerError::Busy => StatusCode::CONFLICT,
            TrackerError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let TrackerError::Upstream { source, .. } = &self {
            tracing::debug!("Upstream failure: {:#}", source);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
