//! Auth session error type.

use thiserror::Error;

/// Errors raised by the auth session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Network-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The login endpoint rejected the credentials.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login response carried no usable access token.
    #[error("no access token in login response")]
    MissingAccessToken,

    /// A refresh was requested but no refresh token is stored.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The refresh endpoint rejected the stored refresh token.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The profile endpoint returned no usable records.
    #[error("profile endpoint returned no user records")]
    ProfileUnavailable,

    /// No user id could be resolved for the current session.
    #[error("could not identify user")]
    UnknownIdentity,
}
