//! Auth service: credential exchange, logout, session introspection.
//!
//! ROLE POLICY
//! ===========
//! The role in the login response is authoritative. The role picked on the
//! login screen is a hint: if it differs from the backend role the login is
//! refused, unless the backend role is `admin`, which may act as any role.
//! A refused login persists nothing.

use std::sync::Arc;

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::models::{Credentials, LoginResponse, Role, User};
use crate::net::transport::{ApiRequest, Transport};
use crate::session::SessionStore;

pub struct AuthService {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    endpoints: Endpoints,
}

impl AuthService {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: Arc<SessionStore>, endpoints: Endpoints) -> Self {
        Self { transport, store, endpoints }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Exchange credentials for tokens and a profile, and persist them.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for blank credentials or a response
    ///   missing `access`, `refresh` or a decodable `user`.
    /// - [`ClientError::Network`] if the backend is unreachable or times out.
    /// - [`ClientError::Auth`] for a non-success status or an unparseable body.
    /// - [`ClientError::RoleDenied`] if the selected role is not permitted.
    /// - [`ClientError::Superseded`] if a logout or newer login happened meanwhile.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let payload = credentials.validate()?;
        let body = serde_json::to_value(&payload).map_err(|e| ClientError::Validation(e.to_string()))?;
        tracing::info!(
            email = %payload.username,
            role_hint = credentials.role_hint.map_or("none", Role::as_str),
            "login attempt"
        );

        let attempt = self.store.begin_attempt();
        let response = self
            .transport
            .send(ApiRequest::post(self.endpoints.login(), body))
            .await?;

        if !response.is_success() {
            tracing::info!(status = response.status, "login rejected");
            return Err(ClientError::Auth {
                status: Some(response.status),
                message: response
                    .error_message()
                    .unwrap_or_else(|| format!("login failed with status {}", response.status)),
            });
        }

        let parsed: LoginResponse = serde_json::from_str(&response.body).map_err(|e| ClientError::Auth {
            status: Some(response.status),
            message: format!("unparseable login response: {e}"),
        })?;
        let grant = parsed.into_grant()?;

        check_role(credentials.role_hint, grant.user.role)?;

        if !self.store.commit_login(attempt, &grant) {
            tracing::info!("login response arrived after the session changed; discarded");
            return Err(ClientError::Superseded);
        }

        tracing::info!(user_id = grant.user.id, role = %grant.user.role, "login succeeded");
        Ok(grant.user)
    }

    /// Clear the session. Never fails.
    pub fn logout(&self) {
        tracing::info!("logout");
        self.store.clear();
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.store.user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.store.role()
    }
}

/// Enforce the role policy for a login with an optional selected role.
///
/// # Errors
///
/// Returns [`ClientError::RoleDenied`] when a non-admin selected a role other than their own.
pub fn check_role(selected: Option<Role>, actual: Role) -> Result<(), ClientError> {
    match selected {
        Some(selected) if selected != actual && actual != Role::Admin => {
            tracing::info!(%selected, %actual, "selected role does not match account role");
            Err(ClientError::RoleDenied { selected, actual })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
