//! Scripted transport, recording navigator and fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::ClientError;
use crate::models::{Role, User};
use crate::routes::Navigator;

// =========================================================================
// ScriptedTransport
// =========================================================================

/// Replays queued responses in order and records every request it sees.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ClientError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Result<ApiResponse, ClientError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses.into()), requests: Mutex::new(Vec::new()) })
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted response".into())))
    }
}

// =========================================================================
// RecordingNavigator
// =========================================================================

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_owned());
    }
}

// =========================================================================
// Fixtures
// =========================================================================

pub(crate) fn user(role: Role) -> User {
    User { id: 7, name: "Avery".into(), email: "a@x.com".into(), role }
}

pub(crate) fn ok(body: serde_json::Value) -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(200, body.to_string()))
}

pub(crate) fn status(code: u16, body: &str) -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(code, body))
}

/// Successful `auth/login/` body for a user with `role`.
pub(crate) fn login_ok(role: &str) -> Result<ApiResponse, ClientError> {
    ok(serde_json::json!({
        "access": "access-1",
        "refresh": "refresh-1",
        "user": { "id": 7, "name": "Avery", "email": "a@x.com", "role": role },
    }))
}
