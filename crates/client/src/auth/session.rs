//! Auth session: login, logout, coordinated token refresh, and the
//! cached user identity.
//!
//! The session is the single owner of authentication state. It talks to
//! the token endpoints directly (they are public, so the interceptor has
//! nothing to add) and publishes every state transition through signals.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use storefront_core::{User, UserId};

use super::error::AuthError;
use super::token::{Token, TokenPrefix, TokenStore};
use crate::config::ClientConfig;
use crate::error::extract_message;
use crate::signal::Signal;
use crate::storage::{Storage, keys};

/// Login endpoint (public).
const LOGIN_PATH: &str = "/users/token/";
/// Refresh endpoint (public).
const REFRESH_PATH: &str = "/users/token/refresh/";

/// Login credentials. The password is wrapped so it never appears in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from plain strings.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Request body for the login endpoint.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response from the token endpoints.
///
/// JWT backends answer with `access`, DRF token auth with `token`; the
/// field present decides the authorization prefix.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Option<Token> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        if let Some(access) = non_empty(self.access) {
            return Some(Token {
                access,
                refresh: self.refresh,
                prefix: TokenPrefix::Bearer,
            });
        }
        non_empty(self.token).map(|access| Token {
            access,
            refresh: self.refresh,
            prefix: TokenPrefix::Token,
        })
    }
}

/// Navigation event asking the host to show the login view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// URL/path to return to after a successful login.
    pub return_to: Option<String>,
}

/// Shared authentication session.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: TokenStore,
    storage: Arc<dyn Storage>,
    current_user: RwLock<Option<User>>,
    last_login_email: RwLock<Option<String>>,
    authenticated: Signal<bool>,
    user: Signal<Option<User>>,
    login_redirect: Signal<Option<LoginRedirect>>,
    /// Serializes refresh attempts; see [`Session::refresh_shared`].
    refresh_gate: Mutex<()>,
}

impl Session {
    /// Create a session over the given storage. Restores the last-login
    /// email and derives the initial auth state from any stored token.
    #[must_use]
    pub fn new(config: &ClientConfig, http: reqwest::Client, storage: Arc<dyn Storage>) -> Self {
        let tokens = TokenStore::new(Arc::clone(&storage));
        let last_login_email = storage.get(keys::LAST_LOGIN_EMAIL);
        let authenticated = Signal::new(tokens.get().is_some());

        Self {
            inner: Arc::new(SessionInner {
                http,
                config: config.clone(),
                tokens,
                storage,
                current_user: RwLock::new(None),
                last_login_email: RwLock::new(last_login_email),
                authenticated,
                user: Signal::new(None),
                login_redirect: Signal::new(None),
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        self.inner.config.endpoint(path)
    }

    // =========================================================================
    // Authentication state
    // =========================================================================

    /// Whether a (non-empty) access token is stored. Purely local and
    /// synchronous; no network call is ever involved.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.tokens.get().is_some()
    }

    /// The persisted token set.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Auth state signal: `true` while authenticated.
    #[must_use]
    pub fn auth_signal(&self) -> Signal<bool> {
        self.inner.authenticated.clone()
    }

    /// Cached user signal.
    #[must_use]
    pub fn user_signal(&self) -> Signal<Option<User>> {
        self.inner.user.clone()
    }

    /// Login-redirect event signal.
    #[must_use]
    pub fn redirect_signal(&self) -> Signal<Option<LoginRedirect>> {
        self.inner.login_redirect.clone()
    }

    /// Ask the host UI to show the login view.
    pub fn request_login_redirect(&self, return_to: Option<String>) {
        self.inner
            .login_redirect
            .set(Some(LoginRedirect { return_to }));
    }

    // =========================================================================
    // Login / logout
    // =========================================================================

    /// Exchange credentials for a token set.
    ///
    /// On success the token is persisted, the last-login email is cached
    /// for identity resolution, and subscribers are notified. Profile
    /// prefetch is the caller's concern (see `AuthService::login`).
    ///
    /// # Errors
    ///
    /// `AuthError::LoginFailed` with the backend's message on rejection;
    /// `AuthError::MissingAccessToken` if the response has no token.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        // Cache the email up front so the profile prefetch that follows a
        // successful login can already resolve by it.
        self.set_last_login_email(Some(credentials.email.clone()));

        let response = self
            .inner
            .http
            .post(self.endpoint(LOGIN_PATH))
            .json(&LoginRequest {
                email: &credentials.email,
                password: credentials.password.expose_secret(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginFailed(extract_message(&body)));
        }

        let body: TokenResponse = response.json().await?;
        let token = body.into_token().ok_or(AuthError::MissingAccessToken)?;

        self.inner.tokens.set(&token);
        self.inner.authenticated.set(true);
        Ok(())
    }

    /// Drop all authentication state and notify subscribers synchronously.
    pub fn logout(&self) {
        self.inner.tokens.clear();
        self.inner.storage.remove(keys::LAST_LOGIN_EMAIL);
        self.set_cached_user(None);
        if let Ok(mut email) = self.inner.last_login_email.write() {
            *email = None;
        }
        self.inner.authenticated.set(false);
    }

    // =========================================================================
    // Token refresh
    // =========================================================================

    /// Refresh the access token using the stored refresh token.
    ///
    /// Failure propagates to the caller; the session is not logged out
    /// here - the caller decides.
    ///
    /// # Errors
    ///
    /// `AuthError::NoRefreshToken` when none is stored,
    /// `AuthError::RefreshFailed` when the backend rejects it.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<Token, AuthError> {
        let _gate = self.inner.refresh_gate.lock().await;
        self.perform_refresh().await
    }

    /// Coordinated refresh for the interceptor: `observed_access` is the
    /// token the caller's failed request went out with. Callers that lose
    /// the race against an in-flight refresh find the token already
    /// replaced when they acquire the gate and reuse it instead of
    /// issuing a second refresh call. A failed refresh drops the token
    /// set before the gate is released, so queued callers fail without a
    /// second refresh call either.
    pub(crate) async fn refresh_shared(&self, observed_access: &str) -> Result<Token, AuthError> {
        let _gate = self.inner.refresh_gate.lock().await;

        if let Some(current) = self.inner.tokens.get()
            && current.access != observed_access
        {
            return Ok(current);
        }

        let result = self.perform_refresh().await;
        if result.is_err() {
            // Still holding the gate: queued callers must observe the
            // cleared store, not re-dial the refresh endpoint with the
            // same stale token.
            self.inner.tokens.clear();
            self.inner.authenticated.set(false);
        }
        result
    }

    async fn perform_refresh(&self) -> Result<Token, AuthError> {
        let refresh = self
            .inner
            .tokens
            .get()
            .and_then(|token| token.refresh)
            .ok_or(AuthError::NoRefreshToken)?;

        let response = self
            .inner
            .http
            .post(self.endpoint(REFRESH_PATH))
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(extract_message(&body)));
        }

        let body: TokenResponse = response.json().await?;
        let mut token = body
            .into_token()
            .ok_or_else(|| AuthError::RefreshFailed("no access token in response".to_string()))?;

        // Rotation is optional: keep the old refresh token unless the
        // backend issued a replacement.
        if token.refresh.is_none() {
            token.refresh = Some(refresh);
        }

        self.inner.tokens.set(&token);
        self.inner.authenticated.set(true);
        Ok(token)
    }

    // =========================================================================
    // User identity
    // =========================================================================

    /// The cached user profile, if one has been fetched this session.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner
            .current_user
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// The cached user's id, if known.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.current_user().and_then(|user| user.id)
    }

    /// Email of the last successful login attempt.
    #[must_use]
    pub fn last_login_email(&self) -> Option<String> {
        self.inner
            .last_login_email
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn set_last_login_email(&self, email: Option<String>) {
        match &email {
            Some(value) => self.inner.storage.set(keys::LAST_LOGIN_EMAIL, value),
            None => self.inner.storage.remove(keys::LAST_LOGIN_EMAIL),
        }
        if let Ok(mut slot) = self.inner.last_login_email.write() {
            *slot = email;
        }
    }

    fn set_cached_user(&self, user: Option<User>) {
        if let Ok(mut slot) = self.inner.current_user.write() {
            slot.clone_from(&user);
        }
        self.inner.user.set(user);
    }

    /// Cache a freshly fetched or updated profile and publish it.
    pub(crate) fn cache_user(&self, user: User) {
        self.set_cached_user(Some(user));
    }

    /// Pick the session's own record out of the profile response and
    /// cache it.
    ///
    /// # Errors
    ///
    /// `AuthError::ProfileUnavailable` when the response held no records.
    pub(crate) fn resolve_and_cache(&self, candidates: Vec<User>) -> Result<User, AuthError> {
        let email = self.last_login_email();
        let user = resolve_identity(candidates, email.as_deref())
            .ok_or(AuthError::ProfileUnavailable)?;
        self.cache_user(user.clone());
        Ok(user)
    }
}

/// Choose the session's own record from the profile response.
///
/// Known-fragile heuristic carried over from the backend contract: the
/// profile endpoint has been observed returning multiple records, so the
/// record whose email matches the last login wins, falling back to the
/// first record. A backend guaranteeing single-user-per-token would make
/// this trivial.
fn resolve_identity(candidates: Vec<User>, last_login_email: Option<&str>) -> Option<User> {
    if candidates.is_empty() {
        return None;
    }

    if let Some(email) = last_login_email {
        if let Some(user) = candidates.iter().find(|user| user.email == email) {
            return Some(user.clone());
        }
        warn!(
            email,
            records = candidates.len(),
            "no profile record matches the last login email, using the first record"
        );
    }

    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use url::Url;

    fn session() -> Session {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1/api").expect("url"));
        Session::new(
            &config,
            reqwest::Client::new(),
            Arc::new(MemoryStorage::default()),
        )
    }

    fn user(id: i64, email: &str) -> User {
        User {
            id: Some(UserId::new(id)),
            name: format!("User {id}"),
            email: email.to_string(),
            phone: None,
            gender: None,
            dob: None,
            address: None,
        }
    }

    #[test]
    fn resolve_identity_prefers_email_match() {
        let picked = resolve_identity(
            vec![user(1, "a@example.com"), user(2, "b@example.com")],
            Some("b@example.com"),
        )
        .expect("resolved");
        assert_eq!(picked.id, Some(UserId::new(2)));
    }

    #[test]
    fn resolve_identity_falls_back_to_first_record() {
        let picked = resolve_identity(
            vec![user(1, "a@example.com"), user(2, "b@example.com")],
            Some("missing@example.com"),
        )
        .expect("resolved");
        assert_eq!(picked.id, Some(UserId::new(1)));
    }

    #[test]
    fn resolve_identity_with_no_candidates_is_none() {
        assert!(resolve_identity(vec![], Some("a@example.com")).is_none());
    }

    #[test]
    fn is_authenticated_reflects_token_store() {
        let session = session();
        assert!(!session.is_authenticated());

        session.tokens().set(&Token {
            access: "abc".into(),
            refresh: None,
            prefix: TokenPrefix::Bearer,
        });
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_clears_state_and_publishes() {
        let session = session();
        session.tokens().set(&Token {
            access: "abc".into(),
            refresh: Some("r1".into()),
            prefix: TokenPrefix::Bearer,
        });
        session.cache_user(user(1, "a@example.com"));
        session.inner.authenticated.set(true);

        session.logout();

        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(!session.auth_signal().get());
        assert!(session.user_signal().get().is_none());
    }

    #[test]
    fn token_response_prefers_jwt_access_field() {
        let jwt: TokenResponse =
            serde_json::from_str(r#"{"access": "a1", "refresh": "r1"}"#).expect("decode");
        let token = jwt.into_token().expect("token");
        assert_eq!(token.prefix, TokenPrefix::Bearer);
        assert_eq!(token.access, "a1");

        let drf: TokenResponse = serde_json::from_str(r#"{"token": "t1"}"#).expect("decode");
        let token = drf.into_token().expect("token");
        assert_eq!(token.prefix, TokenPrefix::Token);

        let empty: TokenResponse = serde_json::from_str(r#"{"access": ""}"#).expect("decode");
        assert!(empty.into_token().is_none());
    }
}
