use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform JSON envelope returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ApiResponse {
    pub fn success(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn failure(error: impl Into<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
            errors,
        }
    }
}

/// A successful envelope paired with its HTTP status.
#[derive(Debug)]
pub struct ApiSuccess {
    pub status: StatusCode,
    pub body: ApiResponse,
}

impl ApiSuccess {
    pub fn ok(data: Value, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse::success(data, message),
        }
    }

    pub fn created(data: Value, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: ApiResponse::success(data, message),
        }
    }
}

impl IntoResponse for ApiSuccess {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
