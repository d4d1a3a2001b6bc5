#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use appointment_cell::services::AppointmentService;

pub fn test_app() -> Router {
    let service = Arc::new(AppointmentService::in_memory());
    Router::new().nest("/appointments", appointment_routes(service))
}

pub fn appointment_body(doctor: &str, date: &str, time: &str) -> Value {
    json!({
        "patientName": "Ana Torres",
        "patientEmail": "ana.torres@example.com",
        "patientPhone": "+34 600 000 000",
        "doctorName": doctor,
        "doctorSpecialty": "Cardiology",
        "appointmentDate": date,
        "appointmentTime": time,
        "symptoms": "chest pain"
    })
}

pub struct TestRequest {
    method: Method,
    uri: String,
    body: Option<String>,
    token: Option<String>,
}

impl TestRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            body: None,
            token: None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn raw(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if self.body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        if let Some(token) = self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = builder
            .body(self.body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Create an appointment and return its id, asserting success.
pub async fn create(app: &Router, body: Value) -> String {
    let (status, json) = TestRequest::new(Method::POST, "/appointments").json(body).send(app).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
    json["data"]["appointment"]["id"].as_str().unwrap().to_string()
}
