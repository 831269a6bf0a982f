use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::{
    domain::batch::{
        dto::{BatchRequest, BatchResponse, LegacyBatchResponse, TaskIdFormat},
        BatchCommand, BatchExecution, BatchService, BatchServiceApi,
    },
    error::AppResult,
    infrastructure::{auth::resolve_credentials, config::Config},
};

pub struct BatchController {
    batch_service: Arc<BatchService>,
    config: Arc<Config>,
}

impl BatchController {
    pub fn new(batch_service: Arc<BatchService>, config: Arc<Config>) -> Self {
        Self {
            batch_service,
            config,
        }
    }

    /// POST /generate-batch - Synthesize every task and report per-task results
    pub async fn generate_batch(
        State(controller): State<Arc<BatchController>>,
        headers: HeaderMap,
        Json(request): Json<BatchRequest>,
    ) -> AppResult<Json<BatchResponse>> {
        let execution = controller
            .execute(&headers, request, TaskIdFormat::Generated)
            .await?;
        Ok(Json(BatchResponse::from(execution)))
    }

    /// POST /generate-batch-legacy - Same batch, flat `{task_id, audio_base64}` list
    pub async fn generate_batch_legacy(
        State(controller): State<Arc<BatchController>>,
        headers: HeaderMap,
        Json(request): Json<BatchRequest>,
    ) -> AppResult<Json<LegacyBatchResponse>> {
        let execution = controller
            .execute(&headers, request, TaskIdFormat::Legacy)
            .await?;
        Ok(Json(LegacyBatchResponse::from(execution.report)))
    }

    async fn execute(
        &self,
        headers: &HeaderMap,
        request: BatchRequest,
        id_format: TaskIdFormat,
    ) -> AppResult<BatchExecution> {
        let (credentials, source) =
            resolve_credentials(headers, request.credentials.as_ref(), &self.config)?;

        let external_limiter_id = request.limiter_id();
        let requested_concurrency = request.requested_concurrency();
        let tasks = request
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                item.into_task(index, &self.config.default_voice_type, id_format)
            })
            .collect();

        tracing::debug!(credential_source = ?source, "Batch credentials resolved");

        let execution = self
            .batch_service
            .run_batch(BatchCommand {
                tasks,
                credentials,
                external_limiter_id,
                requested_concurrency,
            })
            .await?;

        Ok(execution)
    }
}
