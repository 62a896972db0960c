//! Token store: persisted access/refresh tokens and authorization prefix.

use std::fmt;
use std::sync::Arc;

use crate::storage::{Storage, keys};

/// Authorization scheme label paired with the access token.
///
/// `Bearer` for JWT-style backends, `Token` for DRF token auth. The login
/// response shape decides which one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPrefix {
    #[default]
    Bearer,
    Token,
}

impl TokenPrefix {
    /// Parse a persisted prefix, defaulting to `Bearer` for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "Token" { Self::Token } else { Self::Bearer }
    }
}

impl fmt::Display for TokenPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => f.write_str("Bearer"),
            Self::Token => f.write_str("Token"),
        }
    }
}

/// The persisted authentication token set.
///
/// Token strings are opaque; no format validation is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access: String,
    pub refresh: Option<String>,
    pub prefix: TokenPrefix,
}

impl Token {
    /// The value for the `Authorization` header.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.prefix, self.access)
    }
}

/// Persists the token set under three fixed storage keys.
///
/// One instance of the underlying storage exists per client, so the token
/// set is process-wide, like a browser profile's `localStorage`.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read the stored token set. `None` when no (non-empty) access token
    /// is present.
    #[must_use]
    pub fn get(&self) -> Option<Token> {
        let access = self.storage.get(keys::ACCESS_TOKEN)?;
        if access.is_empty() {
            return None;
        }

        let refresh = self.storage.get(keys::REFRESH_TOKEN);
        let prefix = self
            .storage
            .get(keys::TOKEN_PREFIX)
            .map_or_else(TokenPrefix::default, |raw| TokenPrefix::parse(&raw));

        Some(Token {
            access,
            refresh,
            prefix,
        })
    }

    /// Persist a token set, replacing any previous one. A missing refresh
    /// token leaves the previously stored refresh token in place.
    pub fn set(&self, token: &Token) {
        self.storage.set(keys::ACCESS_TOKEN, &token.access);
        self.storage
            .set(keys::TOKEN_PREFIX, &token.prefix.to_string());

        if let Some(refresh) = &token.refresh {
            self.storage.set(keys::REFRESH_TOKEN, refresh);
        }
    }

    /// Delete all three token keys.
    pub fn clear(&self) {
        self.storage.remove(keys::ACCESS_TOKEN);
        self.storage.remove(keys::REFRESH_TOKEN);
        self.storage.remove(keys::TOKEN_PREFIX);
    }
}
