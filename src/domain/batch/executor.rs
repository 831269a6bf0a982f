use super::limiter::Limiter;
use super::model::{Outcome, Task, TaskFailure};
use crate::infrastructure::repositories::{SynthesisRequest, SynthesisSession, TtsRepository};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fans a batch out to the TTS provider, one concurrent unit per task,
/// with every provider call gated by a shared `Limiter`.
pub struct BatchExecutor {
    tts_repo: Arc<dyn TtsRepository>,
}

impl BatchExecutor {
    pub fn new(tts_repo: Arc<dyn TtsRepository>) -> Self {
        Self { tts_repo }
    }

    /// Runs every task and waits for all of them.
    ///
    /// Returns exactly one `Outcome` per task, where position `i` belongs to
    /// `tasks[i]`. Task failures are recorded in the outcome and never abort
    /// the batch. Dropping the returned future aborts all units and returns
    /// their limiter slots.
    pub async fn run(
        &self,
        tasks: &[Task],
        limiter: &Limiter,
        session: &SynthesisSession,
    ) -> Vec<Outcome> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let mut units = JoinSet::new();
        for (index, task) in tasks.iter().enumerate() {
            let task = Arc::new(task.clone());
            let limiter = limiter.clone();
            let session = session.clone();
            let tts_repo = self.tts_repo.clone();

            units.spawn(Self::run_unit(index, task, limiter, session, tts_repo));
        }

        tracing::debug!(
            task_count = tasks.len(),
            capacity = limiter.capacity(),
            available = limiter.available(),
            "Batch units spawned"
        );

        let mut slots: Vec<Option<Outcome>> = (0..tasks.len()).map(|_| None).collect();
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(outcome) => {
                    let index = outcome.index;
                    slots[index] = Some(outcome);
                }
                // Units catch their own panics, so this only fires on runtime shutdown
                Err(e) => tracing::error!(error = %e, "Batch unit did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(tasks)
            .enumerate()
            .map(|(index, (slot, task))| {
                slot.unwrap_or_else(|| {
                    Outcome::failed(
                        index,
                        task.id.clone(),
                        TaskFailure::Aborted("unit terminated without an outcome".to_string()),
                    )
                })
            })
            .collect()
    }

    async fn run_unit(
        index: usize,
        task: Arc<Task>,
        limiter: Limiter,
        session: SynthesisSession,
        tts_repo: Arc<dyn TtsRepository>,
    ) -> Outcome {
        let _permit = match limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(task_index = index, task_id = %task.id, error = %e, "Limiter slot unavailable");
                return Outcome::failed(index, task.id.clone(), TaskFailure::LimiterClosed(e.to_string()));
            }
        };

        let request = SynthesisRequest::from_task(&task);
        let call = AssertUnwindSafe(tts_repo.synthesize(&session, &request)).catch_unwind();

        match call.await {
            Ok(Ok(audio)) => {
                tracing::debug!(
                    task_index = index,
                    task_id = %task.id,
                    audio_size = audio.len(),
                    "Task synthesized"
                );
                Outcome::succeeded(index, task.id.clone(), audio)
            }
            Ok(Err(e)) => {
                tracing::warn!(task_index = index, task_id = %task.id, error = %e, "Task synthesis failed");
                Outcome::failed(index, task.id.clone(), TaskFailure::Synthesis(e.to_string()))
            }
            Err(_) => {
                tracing::error!(task_index = index, task_id = %task.id, "Task synthesis panicked");
                Outcome::failed(
                    index,
                    task.id.clone(),
                    TaskFailure::Aborted("synthesis panicked".to_string()),
                )
            }
        }
    }
}
