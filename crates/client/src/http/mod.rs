//! Intercepted HTTP client.
//!
//! Every API call funnels through [`ApiClient::send`], which attaches the
//! stored authorization header to protected endpoints and handles `401`
//! responses: protected requests trigger one coordinated token refresh and
//! a single replay; public requests (and failed refreshes) drop the
//! session and publish a login-redirect event.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::auth::{Session, Token};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Shared API client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    session: Session,
}

impl ApiClient {
    pub(crate) fn new(config: ClientConfig, http: reqwest::Client, session: Session) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                session,
            }),
        }
    }

    /// The auth session this client reports to.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    fn endpoint(&self, path: &str) -> String {
        self.inner.config.endpoint(path)
    }

    /// Send a request through the interceptor.
    ///
    /// # Errors
    ///
    /// [`ApiError::Http`] on transport failure, [`ApiError::Api`] or
    /// [`ApiError::Unauthorized`] on non-success status,
    /// [`ApiError::Auth`] when a required token refresh fails.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> crate::error::Result<Response> {
        self.send_inner(method, path, body.as_ref()).await
    }

    #[instrument(skip(self, body), fields(%method, path))]
    async fn send_inner<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> crate::error::Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let public = endpoints::is_public(&method, path);
        let token = if public {
            None
        } else {
            self.inner.session.tokens().get()
        };

        let response = self
            .dispatch(&method, path, body, token.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        if public {
            // A 401 off a public endpoint means whatever session state we
            // hold is stale. Login failures stay on the login view.
            debug!(path, "unauthorized on public endpoint, dropping session");
            self.inner.session.logout();
            if !endpoints::is_login(path) {
                self.inner
                    .session
                    .request_login_redirect(Some(path.to_string()));
            }
            return Err(ApiError::from_response(response).await);
        }

        let observed = token.map(|token| token.access).unwrap_or_default();
        match self.inner.session.refresh_shared(&observed).await {
            Ok(fresh) => {
                debug!(path, "replaying request with refreshed token");
                let retry = self.dispatch(&method, path, body, Some(&fresh)).await?;
                Self::check(retry).await
            }
            Err(error) => {
                warn!(path, %error, "token refresh failed, dropping session");
                self.inner.session.logout();
                self.inner
                    .session
                    .request_login_redirect(Some(path.to_string()));
                Err(ApiError::Auth(error))
            }
        }
    }

    async fn dispatch<B>(
        &self,
        method: &Method,
        path: &str,
        body: Option<&B>,
        token: Option<&Token>,
    ) -> Result<Response, reqwest::Error>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.inner.http.request(method.clone(), self.endpoint(path));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, token.authorization_value());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }

    async fn check(response: Response) -> crate::error::Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// GET and decode a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; additionally [`ApiError::Http`] on a body that
    /// fails to decode.
    pub async fn get_json<T>(&self, path: &str) -> crate::error::Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send_inner::<()>(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> crate::error::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send_inner(Method::POST, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn post_json_unit<B>(&self, path: &str, body: &B) -> crate::error::Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_inner(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// PATCH a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> crate::error::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send_inner(Method::PATCH, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// PATCH a JSON body, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn patch_json_unit<B>(&self, path: &str, body: &B) -> crate::error::Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_inner(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }

    /// DELETE, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn delete(&self, path: &str) -> crate::error::Result<()> {
        self.send_inner::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }
}

/// Endpoint classification for the interceptor.
pub(crate) mod endpoints {
    use reqwest::Method;

    /// Public endpoints carry no authorization header and never trigger a
    /// token refresh:
    /// - the token obtain/refresh endpoints themselves,
    /// - account creation and password recovery (POST under `/users/`),
    /// - catalog browsing GETs,
    /// - contact form submission.
    pub(crate) fn is_public(method: &Method, path: &str) -> bool {
        if path.contains("/token/") {
            return true;
        }
        if *method == Method::POST && (path.contains("/users/") || path.contains("/user/")) {
            return true;
        }
        if *method == Method::GET
            && (path.contains("/catalog/products/") || path.contains("/catalog/category/"))
        {
            return true;
        }
        if *method == Method::POST && path.contains("/contact/") {
            return true;
        }
        false
    }

    /// The login endpoint specifically: a 401 here is a wrong password,
    /// not a stale session, so no redirect event is published.
    pub(crate) fn is_login(path: &str) -> bool {
        path.contains("/token/") && !path.contains("/token/refresh/")
    }

}
