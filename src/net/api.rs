//! Authenticated API client.
//!
//! ARCHITECTURE
//! ============
//! Every protected call reads the access token from the session store and
//! sends it as a bearer token. A 401 with a refresh token on hand triggers one
//! `token/refresh/` exchange followed by one retry of the original request.
//! A failed refresh clears the session and navigates to the login page.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent 401s each run their own refresh. A refresh that lands after a
//! logout or a new login leaves the newer session untouched and the call
//! returns `Superseded`.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::config::Endpoints;
use crate::error::ClientError;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::routes::{LOGIN_PATH, Navigator};
use crate::session::SessionStore;

const UNAUTHORIZED: u16 = 401;

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    endpoints: Endpoints,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<SessionStore>,
        endpoints: Endpoints,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self { transport, store, endpoints, navigator }
    }

    /// Send a request to `path` (relative to the API base) with the current
    /// bearer token, refreshing once on 401.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Network`] if the backend is unreachable.
    /// - [`ClientError::SessionExpired`] if a 401 could not be recovered by refreshing.
    /// - [`ClientError::Superseded`] if the session changed while refreshing.
    /// - [`ClientError::Http`] for any other non-success status, including a
    ///   401 without a refresh token or a 401 on the retry.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut request = ApiRequest::new(method, self.endpoints.url(path)?);
        request.body = body;

        let epoch = self.store.epoch();
        let response = self.send_authorized(request.clone(), self.store.access_token()).await?;
        if response.status != UNAUTHORIZED {
            return into_result(response);
        }

        let Some(refresh) = self.store.refresh_token() else {
            tracing::debug!(url = %request.url, "401 without refresh token");
            return into_result(response);
        };

        let access = match self.refresh_access_token(&refresh).await {
            Ok(access) => access,
            Err(e) => {
                if !self.store.clear_if(epoch) {
                    tracing::info!(error = %e, "token refresh failed after the session changed; leaving it alone");
                    return Err(ClientError::Superseded);
                }
                tracing::warn!(error = %e, "token refresh failed; signing out");
                self.navigator.navigate(LOGIN_PATH);
                return Err(ClientError::SessionExpired);
            }
        };
        if !self.store.set_access_token_if(epoch, &access) {
            tracing::info!(url = %request.url, "session changed during token refresh; not retrying");
            return Err(ClientError::Superseded);
        }

        tracing::debug!(url = %request.url, "retrying request with refreshed token");
        let retried = self.send_authorized(request, Some(access)).await?;
        into_result(retried)
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ApiClient::request`], or [`ClientError::Validation`]
    /// if the body does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path, None).await?;
        decode(&response)
    }

    /// POST `body` to `path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ApiClient::request`], or [`ClientError::Validation`]
    /// if the body cannot be encoded or the response does not decode as `T`.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Validation(e.to_string()))?;
        let response = self.request(Method::POST, path, Some(body)).await?;
        decode(&response)
    }

    async fn send_authorized(&self, request: ApiRequest, token: Option<String>) -> Result<ApiResponse, ClientError> {
        self.transport.send(request.with_bearer(token)).await
    }

    async fn refresh_access_token(&self, refresh: &str) -> Result<String, ClientError> {
        let body = serde_json::to_value(RefreshRequest { refresh })
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let response = self
            .transport
            .send(ApiRequest::post(self.endpoints.refresh(), body))
            .await?;
        if !response.is_success() {
            return Err(ClientError::Auth {
                status: Some(response.status),
                message: response
                    .error_message()
                    .unwrap_or_else(|| "refresh rejected".to_owned()),
            });
        }
        let parsed: RefreshResponse = serde_json::from_str(&response.body)
            .map_err(|e| ClientError::Auth { status: Some(response.status), message: e.to_string() })?;
        parsed
            .access
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Validation("refresh response missing `access`".to_owned()))
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Http { status: response.status, body: response.body })
    }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, ClientError> {
    serde_json::from_str(&response.body).map_err(|e| ClientError::Validation(format!("unexpected response body: {e}")))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
