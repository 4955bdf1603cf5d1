use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const API_KEY_HEADER: &str = "x-api-key";

/// A request that presented an allow-listed API key.
///
/// The key is read from `X-API-Key`, falling back to
/// `Authorization: Bearer <key>`. The real-time channel does not use this
/// extractor.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = presented_key(parts)?
            .ok_or_else(|| AppError::Unauthorized("API key is required".to_string()))?;

        if !state.config.is_valid_key(&key) {
            tracing::warn!(path = %parts.uri.path(), "Rejected request with invalid API key");
            return Err(AppError::Unauthorized("Invalid API key".to_string()));
        }

        Ok(ApiKey(key))
    }
}

fn presented_key(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(value) = parts.headers.get(API_KEY_HEADER) {
        let key = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid API key header".into()))?;
        return Ok(Some(key.trim().to_string()).filter(|k| !k.is_empty()));
    }

    if let Some(value) = parts.headers.get(axum::http::header::AUTHORIZATION) {
        let auth_str = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;
        let key = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
        return Ok(Some(key.to_string()).filter(|k| !k.is_empty()));
    }

    Ok(None)
}
