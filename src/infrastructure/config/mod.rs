use crate::domain::batch::{Credentials, LimiterMode, DEFAULT_VOICE_TYPE};
use crate::infrastructure::repositories::volcengine_tts_repository::{DEFAULT_CLUSTER, DEFAULT_ENDPOINT};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Concurrency
    pub default_concurrency: usize,
    pub limiter_mode: LimiterMode,
    pub batch_timeout: Option<Duration>,
    // Admin
    pub admin_api_key: Option<String>,
    // Volcano Engine TTS
    pub server_credentials: Option<Credentials>,
    pub tts_endpoint: String,
    pub tts_cluster: String,
    pub tts_request_timeout: Duration,
    pub default_voice_type: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            default_concurrency: env::var("VOLCENGINE_TTS_CONCURRENCY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            limiter_mode: parse_limiter_mode(
                &env::var("LIMITER_MODE").unwrap_or_else(|_| "global".to_string()),
            )?,
            batch_timeout: optional_var("BATCH_TIMEOUT_SECS")
                .map(|s| s.parse::<u64>().map(Duration::from_secs))
                .transpose()?,
            admin_api_key: optional_var("ADMIN_API_KEY"),
            server_credentials: server_credentials(),
            tts_endpoint: optional_var("VOLCENGINE_TTS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            tts_cluster: optional_var("VOLCENGINE_TTS_CLUSTER")
                .unwrap_or_else(|| DEFAULT_CLUSTER.to_string()),
            tts_request_timeout: Duration::from_secs(
                env::var("TTS_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            ),
            default_voice_type: optional_var("DEFAULT_VOICE_TYPE")
                .unwrap_or_else(|| DEFAULT_VOICE_TYPE.to_string()),
        };

        Ok(config)
    }
}

/// Unset and blank variables are both treated as absent
fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn server_credentials() -> Option<Credentials> {
    let app_id = optional_var("VOLCENGINE_TTS_APPID")?;
    let access_key = optional_var("VOLCENGINE_TTS_ACCESS_KEY")?;
    Some(Credentials::new(app_id, access_key).with_secret_key(optional_var("VOLCENGINE_TTS_SECRET_KEY")))
}

fn parse_limiter_mode(value: &str) -> Result<LimiterMode, String> {
    match value.trim().to_lowercase().as_str() {
        "global" => Ok(LimiterMode::Global),
        "per_batch" | "per-batch" => Ok(LimiterMode::PerBatch),
        other => Err(format!(
            "LIMITER_MODE must be 'global' or 'per_batch', got '{}'",
            other
        )),
    }
}
