//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by the route gate and user-aware views to coordinate login redirects
//! and identity-dependent rendering.
//!
//! LIFECYCLE
//! =========
//! Created with `loading = true`. [`AuthContext::initialize`] reads the stored
//! session and clears the flag; until then the gate answers `Loading` instead
//! of redirecting to the login page.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ClientError;
use crate::models::{Credentials, User};
use crate::services::AuthService;

/// Snapshot of the authentication state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, is_authenticated: false, loading: true }
    }
}

pub struct AuthContext {
    service: Arc<AuthService>,
    state: watch::Sender<AuthState>,
}

impl AuthContext {
    #[must_use]
    pub fn new(service: Arc<AuthService>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { service, state }
    }

    #[must_use]
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }

    /// Load the stored session and leave the loading state.
    pub async fn initialize(&self) {
        tokio::task::yield_now().await;
        let user = self.service.current_user();
        let is_authenticated = self.authenticated_with(user.as_ref());
        tracing::debug!(is_authenticated, "auth context initialized");
        self.state.send_replace(AuthState { user, is_authenticated, loading: false });
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Replace the user and recompute the authenticated flag.
    pub fn set_user(&self, user: Option<User>) {
        let is_authenticated = self.authenticated_with(user.as_ref());
        self.state.send_modify(|state| {
            state.user = user;
            state.is_authenticated = is_authenticated;
        });
    }

    /// Log in through the service and publish the new user.
    ///
    /// # Errors
    ///
    /// Returns whatever [`AuthService::login`] returns; the state is unchanged on error.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let user = self.service.login(credentials).await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub fn logout(&self) {
        self.service.logout();
        self.set_user(None);
    }

    /// Re-read the store. Picks up logins and logouts that did not go through
    /// this context, such as a forced logout after a failed token refresh.
    pub fn sync(&self) {
        let user = self.service.current_user();
        if user != self.user() || self.authenticated_with(user.as_ref()) != self.is_authenticated() {
            self.set_user(user);
        }
    }

    /// Call [`AuthContext::sync`] after every store mutation. Runs until the
    /// surrounding task is cancelled.
    pub async fn follow_store(&self) {
        let mut revisions = self.service.store().subscribe();
        while revisions.changed().await.is_ok() {
            self.sync();
        }
    }

    fn authenticated_with(&self, user: Option<&User>) -> bool {
        user.is_some() && self.service.is_authenticated()
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
