use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::ValidationError(errors) => {
                tracing::warn!("Validation failed: {:?}", errors);
                ApiResponse::failure("Validation failed", Some(errors))
            }
            AppError::Database(msg) | AppError::Internal(msg) => {
                // Never leak internals to the caller
                tracing::error!("Error: {}: {}", status, msg);
                ApiResponse::failure("Internal server error", None)
            }
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::MethodNotAllowed(msg) => {
                tracing::warn!("Error: {}: {}", status, msg);
                ApiResponse::failure(msg, None)
            }
        };

        (status, Json(body)).into_response()
    }
}
