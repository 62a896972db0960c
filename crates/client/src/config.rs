//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_BASE_URL` - Base URL of the backend REST API
//!   (e.g. `http://127.0.0.1:8000/api`)
//!
//! ## Optional
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - HTTP timeout (default: 30)
//! - `STOREFRONT_STORAGE_PATH` - Path for the persistent local store;
//!   when unset, callers typically fall back to in-memory storage

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are resolved against.
    pub api_base_url: Url,
    /// Timeout applied to every outgoing request.
    pub request_timeout: Duration,
    /// Location of the persistent local store, if file-backed.
    pub storage_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a configuration with default timeout and no storage path.
    #[must_use]
    pub const fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base = std::env::var("STOREFRONT_API_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("STOREFRONT_API_BASE_URL".into()))?;
        let api_base_url = Url::parse(&base).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_BASE_URL".into(), e.to_string())
        })?;

        let request_timeout = match std::env::var("STOREFRONT_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("STOREFRONT_REQUEST_TIMEOUT_SECS".into(), raw)
            })?),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let storage_path = std::env::var("STOREFRONT_STORAGE_PATH").ok().map(Into::into);

        Ok(Self {
            api_base_url,
            request_timeout,
            storage_path,
        })
    }

    /// Build the full URL for an API path.
    ///
    /// Joins by plain concatenation (trimming duplicate slashes) so that a
    /// base of `http://host/api` and a path of `/users/token/` yield
    /// `http://host/api/users/token/` - `Url::join` would discard the base
    /// path segment instead.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
