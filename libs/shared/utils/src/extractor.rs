use axum::{
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::auth::User;

/// Returns the bearer token carried by the Authorization header, if any.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_value = headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())?;

    auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller identity for a request.
///
/// Tokens are not validated: any bearer token maps to the fixed stub identity.
pub fn extract_user_from_headers(headers: &HeaderMap) -> Option<User> {
    extract_bearer_token(headers).map(|_| User::stub())
}

/// Client address as seen through a proxy, falling back to `unknown`.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

// Attaches the stub identity when a bearer token is present; never rejects.
pub async fn auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_user_from_headers(request.headers()) {
        Some(user) => {
            debug!("Request authenticated as {}", user.id);
            request.extensions_mut().insert(user);
        }
        None => debug!("Anonymous request"),
    }

    next.run(request).await
}

pub async fn request_logging_middleware(
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4();
    let headers = request.headers();

    info!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        ip = %client_ip(headers),
        user_agent = headers
            .get("user-agent")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown"),
        "Incoming request"
    );

    next.run(request).await
}
