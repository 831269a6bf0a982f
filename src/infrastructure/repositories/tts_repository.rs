use crate::domain::batch::{Credentials, Task, VoiceSettings};
use async_trait::async_trait;
use std::time::Duration;

/// Audio container requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioEncoding {
    #[default]
    Mp3,
    Wav,
    OggOpus,
    Pcm,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::Wav => "wav",
            AudioEncoding::OggOpus => "ogg_opus",
            AudioEncoding::Pcm => "pcm",
        }
    }

    /// Picks the encoding matching an output filename; anything unknown is mp3
    pub fn for_filename(filename: Option<&str>) -> Self {
        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("wav") => AudioEncoding::Wav,
            Some("ogg") | Some("opus") => AudioEncoding::OggOpus,
            Some("pcm") => AudioEncoding::Pcm,
            _ => AudioEncoding::Mp3,
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input of one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: VoiceSettings,
    pub encoding: AudioEncoding,
}

impl SynthesisRequest {
    pub fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            voice: task.voice.clone(),
            encoding: AudioEncoding::for_filename(task.output_name.as_deref()),
        }
    }
}

/// Transport context shared by every provider call of one batch.
///
/// Holds one pooled HTTP client, so connections are reused across the
/// tasks of a batch, and the credentials resolved for that batch.
#[derive(Debug, Clone)]
pub struct SynthesisSession {
    pub http: reqwest::Client,
    pub credentials: Credentials,
}

impl SynthesisSession {
    pub fn new(credentials: Credentials, request_timeout: Duration) -> Result<Self, TtsRepositoryError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TtsRepositoryError::Transport(e.to_string()))?;

        Ok(Self { http, credentials })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TtsRepositoryError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider error (code {code}): {message}")]
    Provider { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider.
///
/// One call is one network round trip: no retries, no splitting.
/// Every failure mode of the provider is reported as `TtsRepositoryError`.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize `request` and return raw audio bytes
    async fn synthesize(
        &self,
        session: &SynthesisSession,
        request: &SynthesisRequest,
    ) -> Result<Vec<u8>, TtsRepositoryError>;
}
