use super::assembler::{assemble, BatchReport};
use super::error::BatchError;
use super::executor::BatchExecutor;
use super::limiter::{Limiter, LimiterError};
use super::model::{Credentials, Task};
use super::registry::{LimiterRegistry, LimiterSummary, Registration, MAX_REGISTERED_CAPACITY};
use crate::infrastructure::repositories::{SynthesisSession, TtsRepository};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Where batches without an external limiter take their slots from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterMode {
    /// One limiter for the whole process
    Global,
    /// A fresh limiter for every batch
    PerBatch,
}

#[derive(Debug, Clone)]
pub struct BatchServiceConfig {
    pub limiter_mode: LimiterMode,
    pub default_concurrency: usize,
    pub request_timeout: Duration,
    pub batch_timeout: Option<Duration>,
}

/// The limiter a batch actually ran under
#[derive(Debug, Clone, PartialEq)]
pub enum LimiterScope {
    Global,
    PerBatch { capacity: usize },
    External { id: String },
}

impl LimiterScope {
    pub fn external_id(&self) -> Option<&str> {
        match self {
            LimiterScope::External { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchCommand {
    pub tasks: Vec<Task>,
    pub credentials: Credentials,
    pub external_limiter_id: Option<String>,
    pub requested_concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BatchExecution {
    pub report: BatchReport,
    pub scope: LimiterScope,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimiterStatus {
    pub mode: LimiterMode,
    pub global_capacity: usize,
    /// Free global slots; `None` when no process-wide limiter is in use
    pub global_available: Option<usize>,
    pub global_closed: bool,
    pub registered_limiters: usize,
}

pub struct BatchService {
    executor: BatchExecutor,
    registry: Arc<LimiterRegistry>,
    global_limiter: Option<Limiter>,
    config: BatchServiceConfig,
}

impl BatchService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        registry: Arc<LimiterRegistry>,
        config: BatchServiceConfig,
    ) -> Result<Self, LimiterError> {
        // Same bound as named limiters; a bad value fails startup, not the first batch
        let default_limiter =
            Limiter::with_max(config.default_concurrency, MAX_REGISTERED_CAPACITY)?;
        let global_limiter = match config.limiter_mode {
            LimiterMode::Global => Some(default_limiter),
            LimiterMode::PerBatch => None,
        };

        Ok(Self {
            executor: BatchExecutor::new(tts_repo),
            registry,
            global_limiter,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<LimiterRegistry> {
        &self.registry
    }

    /// Closes the process-wide limiter and every registered one
    pub async fn shutdown(&self) {
        if let Some(limiter) = &self.global_limiter {
            limiter.close();
        }
        self.registry.close_all().await;
    }
}

#[async_trait]
pub trait BatchServiceApi: Send + Sync {
    /// Run a batch of synthesis tasks
    ///
    /// This operation:
    /// - Validates every task before anything is dispatched
    /// - Resolves the limiter (external > process-wide > per batch)
    /// - Runs all tasks concurrently under that limiter
    /// - Returns one result per task, in input order
    async fn run_batch(&self, command: BatchCommand) -> Result<BatchExecution, BatchError>;

    /// Register a named limiter, or return the one already registered
    async fn register_limiter(&self, id: &str, capacity: usize) -> Result<Registration, LimiterError>;

    async fn list_limiters(&self) -> Vec<LimiterSummary>;

    async fn limiter_status(&self) -> LimiterStatus;
}

#[async_trait]
impl BatchServiceApi for BatchService {
    async fn run_batch(&self, command: BatchCommand) -> Result<BatchExecution, BatchError> {
        let BatchCommand {
            tasks,
            credentials,
            external_limiter_id,
            requested_concurrency,
        } = command;

        tracing::info!(
            task_count = tasks.len(),
            external_limiter_id = ?external_limiter_id,
            requested_concurrency = ?requested_concurrency,
            "Batch synthesis request"
        );

        // 1. Validate tasks before touching any limiter
        for (index, task) in tasks.iter().enumerate() {
            task.validate()
                .map_err(|reason| BatchError::InvalidTask { index, reason })?;
        }

        // 2. Resolve the limiter scope
        let (limiter, scope) = self
            .resolve_limiter(external_limiter_id.as_deref(), requested_concurrency)
            .await?;
        let warnings = precedence_warnings(&scope, requested_concurrency);
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Batch request note");
        }

        if tasks.is_empty() {
            return Ok(BatchExecution {
                report: BatchReport::default(),
                scope,
                warnings,
            });
        }

        // 3. One transport session for the whole batch
        let session = SynthesisSession::new(credentials, self.config.request_timeout)
            .map_err(|e| BatchError::Transport(e.to_string()))?;

        // 4. Fan out and join
        let start_time = std::time::Instant::now();
        let run = self.executor.run(&tasks, &limiter, &session);
        let outcomes = match self.config.batch_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| BatchError::TimedOut(limit))?,
            None => run.await,
        };

        // 5. Assemble the caller-facing report
        let report = assemble(&tasks, outcomes)?;

        tracing::info!(
            total = report.total,
            successful = report.successful_count(),
            failed = report.failed_count(),
            scope = ?scope,
            latency_ms = start_time.elapsed().as_millis(),
            "Batch synthesis completed"
        );

        Ok(BatchExecution {
            report,
            scope,
            warnings,
        })
    }

    async fn register_limiter(&self, id: &str, capacity: usize) -> Result<Registration, LimiterError> {
        self.registry.register(id, capacity).await
    }

    async fn list_limiters(&self) -> Vec<LimiterSummary> {
        self.registry.list().await
    }

    async fn limiter_status(&self) -> LimiterStatus {
        LimiterStatus {
            mode: self.config.limiter_mode,
            global_capacity: self.config.default_concurrency,
            global_available: self.global_limiter.as_ref().map(Limiter::available),
            global_closed: self
                .global_limiter
                .as_ref()
                .map(Limiter::is_closed)
                .unwrap_or(false),
            registered_limiters: self.registry.len().await,
        }
    }
}

impl BatchService {
    /// Picks the limiter for a batch: external, then process-wide, then a
    /// fresh per-batch one.
    async fn resolve_limiter(
        &self,
        external_id: Option<&str>,
        requested_concurrency: Option<usize>,
    ) -> Result<(Limiter, LimiterScope), BatchError> {
        let (limiter, scope) = if let Some(id) = external_id {
            if self.registry.is_closed() {
                return Err(BatchError::LimiterUnavailable(
                    "shared limiters have been shut down".to_string(),
                ));
            }
            match self.registry.get(id).await {
                Some(limiter) => (limiter, LimiterScope::External { id: id.trim().to_string() }),
                None => {
                    return Err(BatchError::UnknownLimiter {
                        id: id.to_string(),
                        available: self.registry.ids().await,
                    })
                }
            }
        } else if let Some(global) = &self.global_limiter {
            (global.clone(), LimiterScope::Global)
        } else {
            let capacity = requested_concurrency.unwrap_or(self.config.default_concurrency);
            let limiter = Limiter::with_max(capacity, MAX_REGISTERED_CAPACITY)
                .map_err(BatchError::InvalidConcurrency)?;
            (limiter, LimiterScope::PerBatch { capacity })
        };

        if limiter.is_closed() {
            return Err(BatchError::LimiterUnavailable(
                "limiter has been shut down".to_string(),
            ));
        }

        Ok((limiter, scope))
    }
}

/// A requested concurrency only applies to per-batch limiters. When a wider
/// scope wins, say so instead of dropping the value silently.
fn precedence_warnings(scope: &LimiterScope, requested_concurrency: Option<usize>) -> Vec<String> {
    match (scope, requested_concurrency) {
        (LimiterScope::Global, Some(requested)) => vec![format!(
            "Requested concurrency {} ignored: the process-wide limiter is in effect",
            requested
        )],
        (LimiterScope::External { id }, Some(requested)) => vec![format!(
            "Requested concurrency {} ignored: external limiter '{}' is in effect",
            requested, id
        )],
        _ => Vec::new(),
    }
}
