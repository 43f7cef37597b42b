use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use route_radar_transit::{QueryError, RefreshError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Query(QueryError::InvalidCoordinate(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Query(QueryError::IndexUnavailable(_)) | ApiError::Refresh(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
