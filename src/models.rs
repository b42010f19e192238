//! Domain and wire types shared by the session store, auth service and API client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

// =============================================================================
// ROLE
// =============================================================================

/// Role asserted by the backend for a user.
///
/// Parsing is case-insensitive; the canonical form is lower-case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Supplier,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Admin, Self::Manager, Self::Staff, Self::Supplier];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::Supplier => "supplier",
        }
    }

    /// Landing page for this role after login.
    #[must_use]
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Manager => "/manager",
            Self::Staff => "/staff",
            Self::Supplier => "/supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            "supplier" => Ok(Self::Supplier),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

// =============================================================================
// USER
// =============================================================================

/// Profile of the signed-in user, replaced wholesale on every login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Login form input. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Role picked on the login screen. Advisory only.
    pub role_hint: Option<Role>,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, role_hint: Option<Role>) -> Self {
        Self { email: email.into(), password: password.into(), role_hint }
    }

    /// Trim the email and reject empty fields before anything hits the network.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the email or password is blank.
    pub fn validate(&self) -> Result<LoginRequest<'_>, ClientError> {
        let username = self.email.trim();
        if username.is_empty() || self.password.trim().is_empty() {
            return Err(ClientError::Validation("email and password are required".to_owned()));
        }
        Ok(LoginRequest { username, password: &self.password, role: self.role_hint })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role_hint", &self.role_hint)
            .finish()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `POST auth/login/`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Raw `auth/login/` response. Every field is optional so that a missing
/// field is reported as a validation failure rather than a parse failure.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<serde_json::Value>,
}

/// Tokens and profile extracted from a validated login response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

impl LoginResponse {
    pub(crate) fn into_grant(self) -> Result<LoginGrant, ClientError> {
        let access = self
            .access
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Validation("login response missing `access`".to_owned()))?;
        let refresh = self
            .refresh
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Validation("login response missing `refresh`".to_owned()))?;
        let user = self
            .user
            .ok_or_else(|| ClientError::Validation("login response missing `user`".to_owned()))?;
        let user: User = serde_json::from_value(user)
            .map_err(|e| ClientError::Validation(format!("login response has invalid `user`: {e}")))?;
        Ok(LoginGrant { access, refresh, user })
    }
}

/// Body of `POST token/refresh/`.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: Option<String>,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
