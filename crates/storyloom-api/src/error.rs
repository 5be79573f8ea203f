//! Storyloom API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storyloom_core::error::StoryError;
use thiserror::Error;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid, or a
    /// collaborator client could not be built from it.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `StoryError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub StoryError);

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            StoryError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            StoryError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            StoryError::ReentrantSubmission => (StatusCode::CONFLICT, "reentrant_submission"),
            StoryError::ModelContractViolation(_) => {
                (StatusCode::BAD_GATEWAY, "model_contract_violation")
            }
            StoryError::ModelTransport(_) => (StatusCode::BAD_GATEWAY, "model_transport_error"),
            StoryError::ImageJobSubmission { .. } => {
                (StatusCode::BAD_GATEWAY, "image_job_submission_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
