//! Authentication: session state, token storage, and the account API.

mod error;
mod session;
mod token;

pub use error::AuthError;
pub use session::{Credentials, LoginRedirect, Session};
pub use token::{Token, TokenPrefix, TokenStore};

use serde::Serialize;
use tracing::{debug, instrument};

use storefront_core::{Listing, User, UserId};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Fetch the authenticated user's profile and cache it on the session.
///
/// Goes through the interceptor, so an expired access token is refreshed
/// and the request replayed transparently.
pub(crate) async fn fetch_profile(api: &ApiClient) -> Result<User, ApiError> {
    let listing: Listing<User> = api.get_json("/users/user/").await?;
    let user = api.session().resolve_and_cache(listing.into_vec())?;
    Ok(user)
}

/// Partial profile update. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    #[serde(flatten)]
    user: &'a User,
    password: &'a str,
}

/// Account operations: login, registration, profile, password recovery.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Log in and kick off a background profile prefetch.
    ///
    /// Authentication state flips as soon as the token lands; the profile
    /// arrives on the user signal shortly after. A failed prefetch is
    /// logged and retried lazily by the next [`Self::profile`] call.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`] from the token exchange.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        self.api.session().login(credentials).await?;

        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(error) = fetch_profile(&api).await {
                debug!(%error, "profile prefetch after login failed");
            }
        });
        Ok(())
    }

    /// Log out locally. Synchronous; there is no server-side session to
    /// revoke.
    pub fn logout(&self) {
        self.api.session().logout();
    }

    /// Whether an access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_authenticated()
    }

    /// The authenticated user's profile, from cache or the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or when no profile
    /// record could be attributed to this session.
    pub async fn profile(&self) -> Result<User, ApiError> {
        if let Some(user) = self.api.session().current_user() {
            return Ok(user);
        }
        fetch_profile(&self.api).await
    }

    /// Register a new account. Does not log the user in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the backend's validation message on
    /// rejection (duplicate email, weak password).
    #[instrument(skip_all, fields(email = %user.email))]
    pub async fn register(&self, user: &User, password: &str) -> Result<(), ApiError> {
        self.api
            .post_json_unit("/users/user/", &RegisterRequest { user, password })
            .await
    }

    /// Patch the profile and refresh the cached user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or validation failure.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let user: User = self
            .api
            .patch_json(&format!("/users/user/{user_id}/"), update)
            .await?;
        self.api.session().cache_user(user.clone());
        Ok(user)
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.api
            .post_json_unit(
                "/users/auth/forgot-password/",
                &serde_json::json!({ "email": email }),
            )
            .await
    }

    /// Complete a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or an invalid token.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        self.api
            .post_json_unit(
                "/users/auth/reset-password/",
                &serde_json::json!({ "token": token, "password": password }),
            )
            .await
    }
}
