use super::assembler::BatchReport;
use super::model::{Task, VoiceSettings};
use super::registry::LimiterSummary;
use super::service::{BatchExecution, LimiterScope};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const KEPT_EXTENSIONS: [&str; 3] = [".mp3", ".wav", ".m4a"];

/// How ids are made up for tasks submitted without one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIdFormat {
    /// `task_<n>_<8 hex chars>`
    Generated,
    /// `legacy_task_<n>`
    Legacy,
}

impl TaskIdFormat {
    /// Id for the task at `index`, `n` counting from 1
    pub fn task_id(&self, index: usize) -> String {
        match self {
            TaskIdFormat::Generated => generate_task_id(index),
            TaskIdFormat::Legacy => format!("legacy_task_{}", index + 1),
        }
    }
}

/// One task of POST /generate-batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    #[serde(default, alias = "text")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
}

impl TaskItem {
    /// Builds the domain task for position `index`, filling in the task id,
    /// the output filename and the voice defaults.
    pub fn into_task(
        self,
        index: usize,
        default_voice_type: &str,
        id_format: TaskIdFormat,
    ) -> Task {
        let id = self
            .task_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| id_format.task_id(index));

        let voice = VoiceSettings {
            voice_type: self
                .voice_type
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default_voice_type.to_string()),
            speed_ratio: self.speed.unwrap_or(1.0),
            volume_ratio: self.volume.unwrap_or(1.0),
            pitch_ratio: self.pitch.unwrap_or(1.0),
        };

        Task::new(id, self.prompt)
            .with_voice(voice)
            .with_output_name(Some(normalize_output_filename(
                self.output_filename.as_deref(),
                index,
            )))
    }
}

/// Caller-supplied provider credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volcengine_tts_appid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volcengine_tts_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volcengine_tts_secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volcengine_tts_concurrency: Option<usize>,
}

/// Request for POST /generate-batch and POST /generate-batch-legacy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub tasks: Vec<TaskItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsInput>,
    #[serde(
        default,
        alias = "external_semaphore_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_limiter_id: Option<String>,
}

impl BatchRequest {
    pub fn requested_concurrency(&self) -> Option<usize> {
        self.credentials
            .as_ref()
            .and_then(|c| c.volcengine_tts_concurrency)
    }

    /// Explicit limiter id, with blank ids treated as absent
    pub fn limiter_id(&self) -> Option<String> {
        self.external_limiter_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub audio_base64: String,
    pub url: Option<String>,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessfulResult {
    pub task_index: usize,
    pub prompt: String,
    pub output_filename: String,
    pub generated_files: Vec<GeneratedFile>,
    pub count: usize,
    pub task_id: String,
    pub voice_type: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FailedResult {
    pub task_index: usize,
    pub prompt: String,
    pub output_filename: String,
    pub error: String,
    pub task_id: String,
}

/// Response for POST /generate-batch
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub total_tasks: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub successful_results: Vec<SuccessfulResult>,
    pub failed_results: Vec<FailedResult>,
    pub external_limiter_used: bool,
    pub limiter_id: Option<String>,
    pub warnings: Vec<String>,
}

impl From<BatchExecution> for BatchResponse {
    fn from(execution: BatchExecution) -> Self {
        let BatchExecution {
            report,
            scope,
            warnings,
        } = execution;

        let successful_results = report
            .successful
            .iter()
            .map(|s| {
                let filename = output_filename(&s.task, s.index);
                SuccessfulResult {
                    task_index: s.index,
                    prompt: s.task.text.clone(),
                    output_filename: filename.clone(),
                    generated_files: vec![GeneratedFile {
                        filename,
                        audio_base64: STANDARD.encode(&s.audio),
                        url: None,
                        duration_seconds: None,
                    }],
                    count: 1,
                    task_id: s.task.id.clone(),
                    voice_type: s.task.voice.voice_type.clone(),
                    success: true,
                }
            })
            .collect();

        let failed_results = report
            .failed
            .iter()
            .map(|f| FailedResult {
                task_index: f.index,
                prompt: f.task.text.clone(),
                output_filename: output_filename(&f.task, f.index),
                error: f.error.clone(),
                task_id: f.task.id.clone(),
            })
            .collect();

        let limiter_id = scope.external_id().map(str::to_string);
        Self {
            success: report.all_succeeded(),
            total_tasks: report.total,
            successful_count: report.successful_count(),
            failed_count: report.failed_count(),
            successful_results,
            failed_results,
            external_limiter_used: matches!(scope, LimiterScope::External { .. }),
            limiter_id,
            warnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyResult {
    pub task_id: String,
    pub audio_base64: String,
}

/// Response for POST /generate-batch-legacy. Failed tasks carry an empty
/// `audio_base64`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyBatchResponse {
    pub results: Vec<LegacyResult>,
}

impl From<BatchReport> for LegacyBatchResponse {
    fn from(report: BatchReport) -> Self {
        let results = report
            .outcomes
            .iter()
            .map(|outcome| LegacyResult {
                task_id: outcome.task_id.clone(),
                audio_base64: STANDARD.encode(outcome.payload()),
            })
            .collect();

        Self { results }
    }
}

/// Request for POST /_admin/limiters
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterLimiterRequest {
    #[serde(alias = "semaphore_id")]
    pub limiter_id: String,
    #[serde(alias = "max_concurrent")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterLimiterResponse {
    pub success: bool,
    pub limiter_id: String,
    pub limit: usize,
    pub created: bool,
    pub available_limiters: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimiterInfo {
    pub limiter_id: String,
    pub limit: usize,
    pub available: usize,
    pub registered_at: DateTime<Utc>,
}

impl From<LimiterSummary> for LimiterInfo {
    fn from(summary: LimiterSummary) -> Self {
        Self {
            limiter_id: summary.id,
            limit: summary.capacity,
            available: summary.available,
            registered_at: summary.registered_at,
        }
    }
}

/// Response for GET /_admin/limiters
#[derive(Debug, Serialize, Deserialize)]
pub struct LimiterListResponse {
    pub count: usize,
    pub limiters: Vec<LimiterInfo>,
}

/// `task_<n>_<8 hex chars>`, `n` counting from 1
pub fn generate_task_id(index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("task_{}_{}", index + 1, &suffix[..8])
}

/// Keeps `.mp3`, `.wav` and `.m4a` names, appends `.mp3` to anything else,
/// and falls back to `generated_audio_<n>.mp3`.
pub fn normalize_output_filename(filename: Option<&str>, index: usize) -> String {
    let name = match filename.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => return format!("generated_audio_{}.mp3", index + 1),
    };

    let lower = name.to_ascii_lowercase();
    if KEPT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        name.to_string()
    } else {
        format!("{}.mp3", name)
    }
}

fn output_filename(task: &Task, index: usize) -> String {
    task.output_name
        .clone()
        .unwrap_or_else(|| normalize_output_filename(None, index))
}
