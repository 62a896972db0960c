//! Unified API error type and backend error-message extraction.
//!
//! Error taxonomy: validation errors are raised before dispatch, 401s are
//! handled centrally by the interceptor, and structured business errors
//! are surfaced verbatim with the most specific message field available.

use thiserror::Error;

use crate::auth::AuthError;

/// Errors produced by intercepted API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request with a structured error body.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The request was rejected with 401 and could not be recovered.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session-level failure (login, refresh, identity resolution).
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Rejected client-side before any network call.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// Build an error from a non-success response, consuming its body.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            Self::Unauthorized(message)
        } else {
            Self::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Result type alias for intercepted API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length of a raw body echoed back as an error message.
const MAX_RAW_MESSAGE_LEN: usize = 200;

/// Pick the most specific error message out of a backend error body:
/// `detail`, then `message`, then the raw body, then a generic fallback.
pub(crate) fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
        if let Some(text) = value.as_str() {
            return text.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed".to_string()
    } else {
        trimmed.chars().take(MAX_RAW_MESSAGE_LEN).collect()
    }
}
