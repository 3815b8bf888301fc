//! Error responses for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::store::AnalysisId;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected by the engine.
    #[error(transparent)]
    Engine(#[from] crate::Error),

    #[error("analysis {0} not found")]
    AnalysisNotFound(AnalysisId),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Engine(crate::Error::Io(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Engine(_) => StatusCode::BAD_REQUEST,
            Self::AnalysisNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.kind(),
            Self::AnalysisNotFound(_) => "NotFound",
            Self::Internal(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "an internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, "client error");
            self.to_string()
        };

        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
