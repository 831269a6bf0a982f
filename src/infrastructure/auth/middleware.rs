use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::config::Config;

pub const ADMIN_API_KEY_HEADER: &str = "admin-api-key";

/// True when the request carries the configured admin key. A server without
/// an admin key configured has no admin callers.
pub fn is_admin(headers: &HeaderMap, config: &Config) -> bool {
    let expected = match config.admin_api_key.as_deref() {
        Some(key) => key,
        None => return false,
    };

    headers
        .get(ADMIN_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|provided| provided == expected)
        .unwrap_or(false)
}

/// Admin middleware for the /_admin routes
pub async fn admin_middleware(
    State(config): State<Arc<Config>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if config.admin_api_key.is_none() {
        return Err(AppError::Unauthorized(
            "Admin API key is not configured on this server".to_string(),
        ));
    }

    if !request.headers().contains_key(ADMIN_API_KEY_HEADER) {
        return Err(AppError::Unauthorized("Missing Admin-API-Key header".to_string()));
    }

    if !is_admin(request.headers(), &config) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with invalid key");
        return Err(AppError::Unauthorized("Invalid admin API key".to_string()));
    }

    Ok(next.run(request).await)
}
