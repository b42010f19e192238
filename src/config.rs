//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_STORAGE_DIR: &str = ".stocked";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

const LOGIN_PATH: &str = "auth/login/";
const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api: Endpoints,
    pub storage_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `STOCKED_API_URL`: default `http://127.0.0.1:8000/api/`
    /// - `STOCKED_STORAGE_DIR`: default `.stocked`
    /// - `STOCKED_REQUEST_TIMEOUT_SECS`: default 10
    /// - `STOCKED_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the API URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_url = std::env::var("STOCKED_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let storage_dir = std::env::var("STOCKED_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("STOCKED_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("STOCKED_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { api: Endpoints::parse(&api_url)?, storage_dir: PathBuf::from(storage_dir), timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Base URL of the REST API plus the two auth endpoints the core talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Parse an API base URL. A missing trailing slash is added so relative
    /// paths resolve underneath it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for unparseable or non-http(s) URLs.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let raw = raw.trim();
        let normalized = if raw.ends_with('/') { raw.to_owned() } else { format!("{raw}/") };
        let base = Url::parse(&normalized).map_err(|e| ClientError::Config(format!("invalid API URL `{raw}`: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!("API URL must be http or https: `{raw}`")));
        }
        Ok(Self { base })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    /// Resolve an API path relative to the base. Leading slashes are ignored
    /// so `/inventory/` and `inventory/` hit the same endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the joined URL is invalid or points
    /// at another origin. Bearer tokens only go to the API host.
    pub fn url(&self, path: &str) -> Result<String, ClientError> {
        let joined = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid API path `{path}`: {e}")))?;
        if joined.origin() != self.base.origin() {
            return Err(ClientError::Config(format!("API path `{path}` leaves the API host")));
        }
        Ok(joined.into())
    }

    #[must_use]
    pub fn login(&self) -> String {
        self.joined(LOGIN_PATH)
    }

    #[must_use]
    pub fn refresh(&self) -> String {
        self.joined(REFRESH_PATH)
    }

    fn joined(&self, path: &str) -> String {
        self.url(path).unwrap_or_else(|_| format!("{}{path}", self.base))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
