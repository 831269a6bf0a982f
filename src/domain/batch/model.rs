use std::fmt;

pub const DEFAULT_VOICE_TYPE: &str = "BV001_streaming";

const SPEED_RATIO_RANGE: (f32, f32) = (0.2, 3.0);
const VOLUME_RATIO_RANGE: (f32, f32) = (0.1, 3.0);
const PITCH_RATIO_RANGE: (f32, f32) = (0.1, 3.0);

/// Resolved provider credentials handed to the batch core.
#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub access_key: String,
    pub secret_key: Option<String>,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            access_key: access_key.into(),
            secret_key: None,
        }
    }

    pub fn with_secret_key(mut self, secret_key: Option<String>) -> Self {
        self.secret_key = secret_key;
        self
    }
}

// Keys never end up in logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("access_key", &"***")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Voice parameters for a single synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice_type: String,
    pub speed_ratio: f32,
    pub volume_ratio: f32,
    pub pitch_ratio: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_type: DEFAULT_VOICE_TYPE.to_string(),
            speed_ratio: 1.0,
            volume_ratio: 1.0,
            pitch_ratio: 1.0,
        }
    }
}

/// One unit of synthesis work inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub voice: VoiceSettings,
    pub output_name: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            voice: VoiceSettings::default(),
            output_name: None,
        }
    }

    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_output_name(mut self, output_name: Option<String>) -> Self {
        self.output_name = output_name;
        self
    }

    /// Checks the invariants a task must hold before it is dispatched.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("task id cannot be empty".to_string());
        }
        if self.text.trim().is_empty() {
            return Err("text cannot be empty".to_string());
        }
        if self.voice.voice_type.trim().is_empty() {
            return Err("voice type cannot be empty".to_string());
        }
        check_ratio("speed", self.voice.speed_ratio, SPEED_RATIO_RANGE)?;
        check_ratio("volume", self.voice.volume_ratio, VOLUME_RATIO_RANGE)?;
        check_ratio("pitch", self.voice.pitch_ratio, PITCH_RATIO_RANGE)?;
        Ok(())
    }
}

fn check_ratio(name: &str, value: f32, (min, max): (f32, f32)) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        ));
    }
    Ok(())
}

/// Why a single task produced no audio
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskFailure {
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("concurrency limiter unavailable: {0}")]
    LimiterClosed(String),

    #[error("task aborted: {0}")]
    Aborted(String),
}

/// Result of attempting one task. Exactly one exists per submitted task.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub index: usize,
    pub task_id: String,
    pub result: Result<Vec<u8>, TaskFailure>,
}

impl Outcome {
    pub fn succeeded(index: usize, task_id: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            index,
            task_id: task_id.into(),
            result: Ok(audio),
        }
    }

    pub fn failed(index: usize, task_id: impl Into<String>, failure: TaskFailure) -> Self {
        Self {
            index,
            task_id: task_id.into(),
            result: Err(failure),
        }
    }

    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Audio bytes, empty when the task failed
    pub fn payload(&self) -> &[u8] {
        match &self.result {
            Ok(audio) => audio,
            Err(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.result.as_ref().err()
    }
}
