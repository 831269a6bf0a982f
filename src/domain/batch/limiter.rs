use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Upper bound accepted for any limiter capacity
pub const MAX_LIMITER_CAPACITY: usize = Semaphore::MAX_PERMITS;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LimiterError {
    #[error("limiter capacity must be between 1 and {max}, got {requested}")]
    InvalidCapacity { requested: usize, max: usize },

    #[error("invalid limiter id: {0}")]
    InvalidId(String),

    #[error("limiter is closed")]
    Closed,
}

/// Counting admission gate bounding concurrent provider calls.
///
/// Cloning is cheap and every clone shares the same slots, so one
/// `Limiter` can be handed to many batches at once.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Limiter {
    pub fn new(capacity: usize) -> Result<Self, LimiterError> {
        Self::with_max(capacity, MAX_LIMITER_CAPACITY)
    }

    pub(crate) fn with_max(capacity: usize, max: usize) -> Result<Self, LimiterError> {
        if capacity == 0 || capacity > max {
            return Err(LimiterError::InvalidCapacity {
                requested: capacity,
                max,
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Waits for a free slot. The slot is returned when the permit drops.
    pub async fn acquire(&self) -> Result<LimiterPermit, LimiterError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LimiterError::Closed)?;

        Ok(LimiterPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free right now. Reading it has no side effects.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Rejects every pending and future `acquire`. Held permits stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// True when both handles gate the same slots
    pub fn same_as(&self, other: &Limiter) -> bool {
        Arc::ptr_eq(&self.semaphore, &other.semaphore)
    }
}

/// A held limiter slot
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}
