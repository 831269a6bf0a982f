use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::batch::{BatchService, BatchServiceApi};
use crate::infrastructure::config::Config;

pub struct HealthController {
    batch_service: Arc<BatchService>,
    config: Arc<Config>,
}

impl HealthController {
    pub fn new(batch_service: Arc<BatchService>, config: Arc<Config>) -> Self {
        Self {
            batch_service,
            config,
        }
    }

    /// GET / and GET /health
    pub async fn health(State(controller): State<Arc<HealthController>>) -> impl IntoResponse {
        let status = controller.batch_service.limiter_status().await;
        let (code, label) = if status.global_closed {
            (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
        } else {
            (StatusCode::OK, "healthy")
        };

        (
            code,
            Json(json!({
                "status": label,
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "limiter_mode": status.mode,
                "global_concurrency_limit": status.global_capacity,
                "available_slots": status.global_available,
                "registered_limiters": status.registered_limiters,
                "admin_key_configured": controller.config.admin_api_key.is_some(),
                "server_credentials_configured": controller.config.server_credentials.is_some(),
            })),
        )
    }
}
