use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use volc_batch_tts::infrastructure::repositories::{
    SynthesisRequest, SynthesisSession, TtsRepository, TtsRepositoryError,
};

/// In-process stand-in for the Volcano Engine API.
///
/// Returns `audio:<text>` as the payload, fails any text registered with
/// `fail_on`, and tracks in-flight calls.
#[derive(Default)]
pub struct FakeTts {
    delay: Mutex<Duration>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<CallRecord>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub text: String,
    pub app_id: String,
    pub voice_type: String,
}

#[allow(dead_code)]
impl FakeTts {
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn fail_on(&self, text: &str) {
        self.failing.lock().insert(text.to_string());
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn reset_max_active(&self) {
        self.max_active.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(
        &self,
        session: &SynthesisSession,
        request: &SynthesisRequest,
    ) -> Result<Vec<u8>, TtsRepositoryError> {
        self.calls.lock().push(CallRecord {
            text: request.text.clone(),
            app_id: session.credentials.app_id.clone(),
            voice_type: request.voice.voice_type.clone(),
        });

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock();
        tokio::time::sleep(delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(&request.text) {
            return Err(TtsRepositoryError::Status {
                status: 500,
                body: "synthetic upstream failure".to_string(),
            });
        }

        Ok(format!("audio:{}", request.text).into_bytes())
    }
}
