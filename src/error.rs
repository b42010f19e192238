//! Error taxonomy for the session core.
//!
//! ERROR HANDLING
//! ==============
//! `ClientError` is what callers see. Login/logout failures are turned into a
//! user-facing message with [`ClientError::user_message`]; refresh and storage
//! failures are handled internally and only surface as `SessionExpired` when
//! they end in a forced logout. `StorageError` never leaves the store: it is
//! logged and the store degrades to its in-memory copy.

use crate::models::Role;

/// Stable machine-readable code and retry hint for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// CLIENT ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend was unreachable or the request timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the login or returned a body that could not be parsed.
    #[error("authentication failed: {message}")]
    Auth { status: Option<u16>, message: String },

    /// Input or a response was missing required fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend role does not allow acting as the selected role.
    #[error("role `{selected}` not permitted for account with role `{actual}`")]
    RoleDenied { selected: Role, actual: Role },

    /// A protected call returned 401 and the token refresh failed.
    #[error("session expired")]
    SessionExpired,

    /// The session changed while this request was in flight; its result was dropped.
    #[error("session changed while request was in flight")]
    Superseded,

    /// A protected call returned a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    /// Client configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// Text suitable for showing to the person at the login screen or page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Cannot reach the server. Check your connection and try again.".to_owned(),
            Self::Auth { .. } => "Invalid email or password. Please try again.".to_owned(),
            Self::Validation(msg) => format!("Login failed: {msg}"),
            Self::RoleDenied { selected, actual } => {
                format!("You don't have {selected} privileges. Please select your actual role: {actual}")
            }
            Self::SessionExpired => "Your session has expired. Please sign in again.".to_owned(),
            Self::Superseded => "Your session changed. Please try again.".to_owned(),
            Self::Http { status: 403, .. } => "You are not allowed to do that.".to_owned(),
            Self::Http { status, .. } => format!("Request failed ({status})."),
            Self::Config(msg) => format!("Configuration error: {msg}"),
        }
    }
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Auth { .. } => "E_AUTH",
            Self::Validation(_) => "E_VALIDATION",
            Self::RoleDenied { .. } => "E_ROLE_DENIED",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::Superseded => "E_SUPERSEDED",
            Self::Http { .. } => "E_HTTP",
            Self::Config(_) => "E_CONFIG",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Superseded | Self::Http { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// STORAGE ERROR
// =============================================================================

/// Failure of the durable storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend is disabled or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A value read back after a write did not match what was written.
    #[error("storage write verification failed for `{key}`")]
    Mismatch { key: String },
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORAGE_IO",
            Self::Unavailable(_) => "E_STORAGE_UNAVAILABLE",
            Self::Mismatch { .. } => "E_STORAGE_MISMATCH",
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
