use super::assembler::AssemblyError;
use super::limiter::LimiterError;
use crate::error::AppError;
use std::time::Duration;

/// Errors that fail a whole batch request. Per-task failures never show up here.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("task {index} is invalid: {reason}")]
    InvalidTask { index: usize, reason: String },

    #[error("invalid concurrency: {0}")]
    InvalidConcurrency(LimiterError),

    #[error("External limiter '{id}' not found. Available: {available:?}")]
    UnknownLimiter { id: String, available: Vec<String> },

    #[error("Concurrency limiter unavailable: {0}")]
    LimiterUnavailable(String),

    #[error("Batch did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("transport setup failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidTask { .. } | BatchError::InvalidConcurrency(_) => {
                AppError::BadRequest(err.to_string())
            }
            BatchError::UnknownLimiter { .. } => AppError::LimiterNotFound(err.to_string()),
            BatchError::LimiterUnavailable(_) => AppError::LimiterUnavailable(err.to_string()),
            BatchError::TimedOut(_) => AppError::Timeout(err.to_string()),
            BatchError::Transport(_) | BatchError::Assembly(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<LimiterError> for AppError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::Closed => AppError::LimiterUnavailable(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
