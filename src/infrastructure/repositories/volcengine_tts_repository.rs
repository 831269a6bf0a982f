use super::tts_repository::{SynthesisRequest, SynthesisSession, TtsRepository, TtsRepositoryError};
use crate::domain::batch::Credentials;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ENDPOINT: &str = "https://openspeech.bytedance.com/api/v1/tts";
pub const DEFAULT_CLUSTER: &str = "volcano_tts";

/// Envelope code the provider uses for a successful synthesis
const SUCCESS_CODE: i64 = 3000;
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    app: AppSection<'a>,
    user: UserSection,
    audio: AudioSection<'a>,
    request: RequestSection<'a>,
}

#[derive(Debug, Serialize)]
struct AppSection<'a> {
    appid: &'a str,
    token: &'a str,
    cluster: &'a str,
}

#[derive(Debug, Serialize)]
struct UserSection {
    uid: String,
}

#[derive(Debug, Serialize)]
struct AudioSection<'a> {
    voice_type: &'a str,
    encoding: &'a str,
    speed_ratio: f32,
    volume_ratio: f32,
    pitch_ratio: f32,
}

#[derive(Debug, Serialize)]
struct RequestSection<'a> {
    reqid: String,
    text: &'a str,
    text_type: &'a str,
    operation: &'a str,
}

#[derive(Debug, Deserialize)]
struct TtsHttpResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// Volcano Engine HTTP (non-streaming) implementation of TTS repository
pub struct VolcengineTtsRepository {
    endpoint: String,
    cluster: String,
}

impl VolcengineTtsRepository {
    pub fn new(endpoint: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cluster: cluster.into(),
        }
    }

    fn build_body<'a>(
        &'a self,
        credentials: &'a Credentials,
        request: &'a SynthesisRequest,
    ) -> TtsHttpRequest<'a> {
        TtsHttpRequest {
            app: AppSection {
                appid: &credentials.app_id,
                // The access key doubles as the app token for this cluster
                token: &credentials.access_key,
                cluster: &self.cluster,
            },
            user: UserSection {
                uid: Uuid::new_v4().to_string(),
            },
            audio: AudioSection {
                voice_type: &request.voice.voice_type,
                encoding: request.encoding.as_str(),
                speed_ratio: request.voice.speed_ratio,
                volume_ratio: request.voice.volume_ratio,
                pitch_ratio: request.voice.pitch_ratio,
            },
            request: RequestSection {
                reqid: Uuid::new_v4().to_string(),
                text: &request.text,
                text_type: "plain",
                operation: "query",
            },
        }
    }
}

#[async_trait]
impl TtsRepository for VolcengineTtsRepository {
    async fn synthesize(
        &self,
        session: &SynthesisSession,
        request: &SynthesisRequest,
    ) -> Result<Vec<u8>, TtsRepositoryError> {
        let start_time = std::time::Instant::now();
        let body = self.build_body(&session.credentials, request);

        tracing::debug!(
            endpoint = %self.endpoint,
            voice_type = %request.voice.voice_type,
            encoding = %request.encoding,
            text_length = request.text.len(),
            "Calling Volcano Engine TTS API"
        );

        let response = session
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer;{}", session.credentials.access_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsRepositoryError::Timeout
                } else {
                    TtsRepositoryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsRepositoryError::Status {
                status: status.as_u16(),
                body: truncate(&error_text, MAX_ERROR_BODY_LEN),
            });
        }

        let envelope = response
            .json::<TtsHttpResponse>()
            .await
            .map_err(|e| TtsRepositoryError::InvalidResponse(e.to_string()))?;
        let audio = decode_envelope(envelope)?;

        tracing::debug!(
            provider = "volcengine",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            "TTS synthesis completed"
        );

        Ok(audio)
    }
}

/// Extracts audio from a provider envelope. A 2xx response may still carry
/// a provider error code, and an empty payload counts as a failure.
fn decode_envelope(envelope: TtsHttpResponse) -> Result<Vec<u8>, TtsRepositoryError> {
    if envelope.code != SUCCESS_CODE {
        return Err(TtsRepositoryError::Provider {
            code: envelope.code,
            message: envelope
                .message
                .unwrap_or_else(|| "Unknown API error".to_string()),
        });
    }

    let data = envelope
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| TtsRepositoryError::InvalidResponse("missing audio data".to_string()))?;

    let audio = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| TtsRepositoryError::InvalidResponse(format!("invalid base64 audio: {}", e)))?;

    if audio.is_empty() {
        return Err(TtsRepositoryError::InvalidResponse(
            "empty audio data returned".to_string(),
        ));
    }

    Ok(audio)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
