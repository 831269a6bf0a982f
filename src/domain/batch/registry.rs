use super::limiter::{Limiter, LimiterError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Largest capacity a named limiter may be registered with
pub const MAX_REGISTERED_CAPACITY: usize = 1000;
const MAX_LIMITER_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
struct RegisteredLimiter {
    limiter: Limiter,
    registered_at: DateTime<Utc>,
}

/// Result of a registration call
#[derive(Debug, Clone)]
pub struct Registration {
    pub limiter: Limiter,
    /// False when the id was already registered and the existing limiter was returned
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimiterSummary {
    pub id: String,
    pub capacity: usize,
    pub available: usize,
    pub registered_at: DateTime<Utc>,
}

/// Named limiters shared by unrelated batch requests.
///
/// Once `close_all` has run the registry stays closed: registration fails
/// and lookups find nothing.
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    limiters: Mutex<HashMap<String, RegisteredLimiter>>,
    // Written only while `limiters` is locked
    closed: AtomicBool,
}

impl LimiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` with `capacity`, or returns the limiter already
    /// registered under `id` untouched.
    pub async fn register(&self, id: &str, capacity: usize) -> Result<Registration, LimiterError> {
        let id = validate_id(id)?;
        // Validate before taking the lock so bad input never touches the map
        let candidate = Limiter::with_max(capacity, MAX_REGISTERED_CAPACITY)?;

        let mut limiters = self.limiters.lock().await;
        if self.is_closed() {
            return Err(LimiterError::Closed);
        }
        if let Some(existing) = limiters.get(id) {
            tracing::warn!(
                limiter_id = %id,
                existing_capacity = existing.limiter.capacity(),
                requested_capacity = capacity,
                "Limiter already registered, returning existing one"
            );
            return Ok(Registration {
                limiter: existing.limiter.clone(),
                created: false,
            });
        }

        limiters.insert(
            id.to_string(),
            RegisteredLimiter {
                limiter: candidate.clone(),
                registered_at: Utc::now(),
            },
        );
        tracing::info!(limiter_id = %id, capacity, "Shared limiter registered");

        Ok(Registration {
            limiter: candidate,
            created: true,
        })
    }

    pub async fn get(&self, id: &str) -> Option<Limiter> {
        if self.is_closed() {
            return None;
        }
        self.limiters
            .lock()
            .await
            .get(id.trim())
            .map(|entry| entry.limiter.clone())
    }

    /// Registered ids in ascending order
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.limiters.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn list(&self) -> Vec<LimiterSummary> {
        let mut summaries: Vec<LimiterSummary> = self
            .limiters
            .lock()
            .await
            .iter()
            .map(|(id, entry)| LimiterSummary {
                id: id.clone(),
                capacity: entry.limiter.capacity(),
                available: entry.limiter.available(),
                registered_at: entry.registered_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub async fn len(&self) -> usize {
        self.limiters.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes every registered limiter, empties the registry and refuses
    /// any later registration.
    pub async fn close_all(&self) {
        let mut limiters = self.limiters.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        for entry in limiters.values() {
            entry.limiter.close();
        }
        let count = limiters.len();
        limiters.clear();
        tracing::info!(count, "Shared limiters closed");
    }
}

fn validate_id(id: &str) -> Result<&str, LimiterError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LimiterError::InvalidId("id cannot be empty".to_string()));
    }
    if id.chars().count() > MAX_LIMITER_ID_LEN {
        return Err(LimiterError::InvalidId(format!(
            "id must be {} characters or less",
            MAX_LIMITER_ID_LEN
        )));
    }
    Ok(id)
}
