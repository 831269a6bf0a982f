use axum::http::HeaderMap;

use super::middleware::is_admin;
use crate::domain::batch::{dto::CredentialsInput, Credentials};
use crate::error::AppError;
use crate::infrastructure::config::Config;

/// Where the credentials of a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Admin,
    Payload,
    Server,
}

/// Resolves the provider credentials for one batch request.
///
/// Order: admin key (server credentials), complete payload credentials,
/// server credentials. Anything else is unauthorized.
pub fn resolve_credentials(
    headers: &HeaderMap,
    payload: Option<&CredentialsInput>,
    config: &Config,
) -> Result<(Credentials, CredentialSource), AppError> {
    if is_admin(headers, config) {
        let credentials = config.server_credentials.clone().ok_or_else(|| {
            AppError::Internal("Server TTS credentials are not configured".to_string())
        })?;
        return Ok((credentials, CredentialSource::Admin));
    }

    if let Some(credentials) = payload.and_then(complete_payload_credentials) {
        return Ok((credentials, CredentialSource::Payload));
    }

    if let Some(credentials) = config.server_credentials.clone() {
        return Ok((credentials, CredentialSource::Server));
    }

    Err(AppError::Unauthorized(
        "Provide an admin API key or complete Volcano Engine credentials".to_string(),
    ))
}

fn complete_payload_credentials(input: &CredentialsInput) -> Option<Credentials> {
    let app_id = non_blank(input.volcengine_tts_appid.as_deref())?;
    let access_key = non_blank(input.volcengine_tts_access_key.as_deref())?;
    let secret_key = non_blank(input.volcengine_tts_secret_key.as_deref()).map(str::to_string);

    Some(Credentials::new(app_id, access_key).with_secret_key(secret_key))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
