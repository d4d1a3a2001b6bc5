use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use appointment_cell::handlers::method_not_allowed;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::AppointmentService;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::request_logging_middleware;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, HeaderName::from_static("x-api-key")])
}

pub fn create_router(service: Arc<AppointmentService>, config: &AppConfig) -> Router {
    let banner = format!("{} v{} is running!", config.app_name, config.app_version);

    Router::new()
        .route("/", get(move || async move { banner }))
        .nest("/appointments", appointment_routes(service))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer())
}
