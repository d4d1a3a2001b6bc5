// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response::ApiSuccess;

use crate::models::{AppointmentError, AppointmentListQuery, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::appointment::AppointmentService;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::ValidationFailed(errors) => AppError::ValidationError(errors),
            AppointmentError::ConflictDetected => AppError::Conflict(err.to_string()),
            AppointmentError::InvalidRequest(msg) => AppError::BadRequest(msg),
            AppointmentError::Store(msg) => AppError::Database(msg),
        }
    }
}

// Bodies are decoded by hand so malformed JSON still gets the standard envelope.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("Request body is required".to_string()));
    }

    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

fn user_id(user: Option<Extension<User>>) -> Option<String> {
    user.map(|Extension(user)| user.id)
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(service): State<Arc<AppointmentService>>,
    user: Option<Extension<User>>,
    body: Bytes,
) -> Result<ApiSuccess, AppError> {
    let request: CreateAppointmentRequest = parse_body(&body)?;
    let appointment = service.create_appointment(request, user_id(user)).await?;

    Ok(ApiSuccess::created(
        json!({ "appointment": appointment }),
        "Appointment created successfully",
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentService>>,
    query: Result<Query<AppointmentListQuery>, QueryRejection>,
) -> Result<ApiSuccess, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(format!("Invalid query parameters: {}", e)))?;
    let response = service.list_appointments(query).await?;

    Ok(ApiSuccess::ok(json!(response), "Appointments retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_appointment_stats(
    State(service): State<Arc<AppointmentService>>,
) -> Result<ApiSuccess, AppError> {
    let stats = service.get_stats().await?;

    Ok(ApiSuccess::ok(json!({ "stats": stats }), "Statistics retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
) -> Result<ApiSuccess, AppError> {
    let appointment = service.get_appointment(&appointment_id).await?;

    Ok(ApiSuccess::ok(
        json!({ "appointment": appointment }),
        "Appointment retrieved successfully",
    ))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
    user: Option<Extension<User>>,
    body: Bytes,
) -> Result<ApiSuccess, AppError> {
    let changes: UpdateAppointmentRequest = parse_body(&body)?;
    let appointment = service
        .update_appointment(&appointment_id, changes, user_id(user))
        .await?;

    Ok(ApiSuccess::ok(
        json!({ "appointment": appointment }),
        "Appointment updated successfully",
    ))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
) -> Result<ApiSuccess, AppError> {
    let appointment = service.delete_appointment(&appointment_id).await?;

    Ok(ApiSuccess::ok(
        json!({ "appointment": appointment }),
        "Appointment deleted successfully",
    ))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
    user: Option<Extension<User>>,
) -> Result<ApiSuccess, AppError> {
    let appointment = service.confirm_appointment(&appointment_id, user_id(user)).await?;

    Ok(ApiSuccess::ok(
        json!({ "appointment": appointment }),
        "Appointment confirmed successfully",
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<String>,
    user: Option<Extension<User>>,
) -> Result<ApiSuccess, AppError> {
    let appointment = service.cancel_appointment(&appointment_id, user_id(user)).await?;

    Ok(ApiSuccess::ok(
        json!({ "appointment": appointment }),
        "Appointment cancelled successfully",
    ))
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".to_string())
}
