use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    domain::batch::{
        dto::{LimiterInfo, LimiterListResponse, RegisterLimiterRequest, RegisterLimiterResponse},
        BatchService, BatchServiceApi,
    },
    error::AppResult,
};

pub struct LimiterController {
    batch_service: Arc<BatchService>,
}

impl LimiterController {
    pub fn new(batch_service: Arc<BatchService>) -> Self {
        Self { batch_service }
    }

    /// GET /_admin/limiters - List registered shared limiters
    pub async fn list_limiters(
        State(controller): State<Arc<LimiterController>>,
    ) -> AppResult<Json<LimiterListResponse>> {
        let limiters: Vec<LimiterInfo> = controller
            .batch_service
            .list_limiters()
            .await
            .into_iter()
            .map(LimiterInfo::from)
            .collect();

        Ok(Json(LimiterListResponse {
            count: limiters.len(),
            limiters,
        }))
    }

    /// POST /_admin/limiters - Register a shared limiter (idempotent)
    pub async fn register_limiter(
        State(controller): State<Arc<LimiterController>>,
        Json(request): Json<RegisterLimiterRequest>,
    ) -> AppResult<(StatusCode, Json<RegisterLimiterResponse>)> {
        let registration = controller
            .batch_service
            .register_limiter(&request.limiter_id, request.limit)
            .await?;

        let available_limiters = controller.batch_service.registry().ids().await;
        let status = if registration.created {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };

        Ok((
            status,
            Json(RegisterLimiterResponse {
                success: true,
                limiter_id: request.limiter_id.trim().to_string(),
                limit: registration.limiter.capacity(),
                created: registration.created,
                available_limiters,
            }),
        ))
    }
}
