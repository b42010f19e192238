use super::*;
use crate::net::test_helpers::{self, ScriptedTransport, login_ok, ok, status};
use crate::net::transport::ApiResponse;
use crate::routes::{self, Navigation, Page};
use crate::state::auth::AuthState;

const API: &str = "http://127.0.0.1:8000/api/";

fn service(transport: &Arc<ScriptedTransport>) -> AuthService {
    AuthService::new(
        Arc::clone(transport) as Arc<dyn Transport>,
        Arc::new(SessionStore::in_memory()),
        Endpoints::parse(API).unwrap(),
    )
}

fn creds(hint: Option<Role>) -> Credentials {
    Credentials::new("a@x.com", "pw", hint)
}

fn signed_in_state(user: User) -> AuthState {
    AuthState { user: Some(user), is_authenticated: true, loading: false }
}

/// Runs a hook while the login request is in flight, then answers with `response`.
struct InterruptingTransport {
    during_send: Box<dyn Fn() + Send + Sync>,
    response: ApiResponse,
}

#[async_trait::async_trait]
impl Transport for InterruptingTransport {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, ClientError> {
        (self.during_send)();
        Ok(self.response.clone())
    }
}

// =============================================================================
// login / logout
// =============================================================================

#[tokio::test]
async fn fresh_session_is_not_authenticated() {
    let svc = service(&ScriptedTransport::new(vec![]));
    assert!(!svc.is_authenticated());
    assert_eq!(svc.current_user(), None);
    assert_eq!(svc.role(), None);
}

#[tokio::test]
async fn login_then_logout_toggles_authentication() {
    let transport = ScriptedTransport::new(vec![login_ok("staff")]);
    let svc = service(&transport);

    let user = svc.login(&creds(Some(Role::Staff))).await.unwrap();
    assert_eq!(user, test_helpers::user(Role::Staff));
    assert!(svc.is_authenticated());
    assert_eq!(svc.current_user(), Some(user));

    svc.logout();
    assert!(!svc.is_authenticated());
    assert_eq!(svc.current_user(), None);
    assert_eq!(svc.store().access_token(), None);
}

#[tokio::test]
async fn login_posts_credentials_to_login_endpoint() {
    let transport = ScriptedTransport::new(vec![login_ok("manager")]);
    let svc = service(&transport);
    svc.login(&Credentials::new(" a@x.com ", "pw", Some(Role::Manager))).await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://127.0.0.1:8000/api/auth/login/");
    assert_eq!(sent[0].method, reqwest::Method::POST);
    assert_eq!(
        sent[0].body,
        Some(serde_json::json!({ "username": "a@x.com", "password": "pw", "role": "manager" }))
    );
    assert_eq!(sent[0].bearer, None);
}

#[tokio::test]
async fn login_persists_tokens_user_and_role() {
    let transport = ScriptedTransport::new(vec![login_ok("supplier")]);
    let svc = service(&transport);
    svc.login(&creds(None)).await.unwrap();

    let store = svc.store();
    assert_eq!(store.access_token().as_deref(), Some("access-1"));
    assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    assert_eq!(store.role(), Some(Role::Supplier));
    assert_eq!(svc.role(), Some(Role::Supplier));
}

// =============================================================================
// Role policy scenarios
// =============================================================================

#[tokio::test]
async fn staff_hint_with_staff_account_opens_staff_dashboard() {
    let transport = ScriptedTransport::new(vec![login_ok("staff")]);
    let svc = service(&transport);

    let user = svc.login(&creds(Some(Role::Staff))).await.unwrap();
    assert_eq!(svc.store().user().map(|u| u.role), Some(Role::Staff));

    let landing = routes::landing_path(user.role, Some(Role::Staff));
    assert_eq!(landing, "/staff");
    assert_eq!(routes::navigate(landing, &signed_in_state(user)), Navigation::Render(Page::StaffDashboard));
}

#[tokio::test]
async fn staff_hint_with_admin_account_is_granted_staff_area() {
    let transport = ScriptedTransport::new(vec![login_ok("admin")]);
    let svc = service(&transport);

    let user = svc.login(&creds(Some(Role::Staff))).await.unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(svc.role(), Some(Role::Admin));

    let landing = routes::landing_path(user.role, Some(Role::Staff));
    assert_eq!(landing, "/staff");
    let state = signed_in_state(user);
    assert_eq!(routes::navigate(landing, &state), Navigation::Render(Page::StaffDashboard));
    assert_eq!(routes::navigate("/staff/orders", &state), Navigation::Render(Page::PlaceOrder));
}

#[tokio::test]
async fn mismatched_hint_for_non_admin_is_denied_and_not_persisted() {
    let transport = ScriptedTransport::new(vec![login_ok("staff")]);
    let svc = service(&transport);

    let err = svc.login(&creds(Some(Role::Manager))).await.unwrap_err();
    assert!(matches!(err, ClientError::RoleDenied { selected: Role::Manager, actual: Role::Staff }));
    assert!(!svc.is_authenticated());
    assert_eq!(svc.store().access_token(), None);
}

#[test]
fn check_role_policy_table() {
    assert!(check_role(None, Role::Staff).is_ok());
    assert!(check_role(Some(Role::Staff), Role::Staff).is_ok());
    assert!(check_role(Some(Role::Supplier), Role::Admin).is_ok());
    assert!(check_role(Some(Role::Admin), Role::Manager).is_err());
    assert!(check_role(Some(Role::Staff), Role::Supplier).is_err());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn blank_credentials_fail_without_network() {
    let transport = ScriptedTransport::new(vec![]);
    let svc = service(&transport);
    let err = svc.login(&Credentials::new("   ", "pw", None)).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn rejected_credentials_are_auth_errors() {
    let transport = ScriptedTransport::new(vec![status(401, r#"{"detail":"No active account found"}"#)]);
    let svc = service(&transport);

    let err = svc.login(&creds(None)).await.unwrap_err();
    match err {
        ClientError::Auth { status, message } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "No active account found");
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    assert!(!svc.is_authenticated());
}

#[tokio::test]
async fn unparseable_body_is_auth_error() {
    let transport = ScriptedTransport::new(vec![status(200, "<html>oops</html>")]);
    let svc = service(&transport);
    assert!(matches!(svc.login(&creds(None)).await, Err(ClientError::Auth { .. })));
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let transport = ScriptedTransport::new(vec![ok(serde_json::json!({ "message": "Login successful", "role": "staff" }))]);
    let svc = service(&transport);
    assert!(matches!(svc.login(&creds(None)).await, Err(ClientError::Validation(_))));
    assert!(!svc.is_authenticated());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let transport = ScriptedTransport::new(vec![Err(ClientError::Network("timed out".into()))]);
    let svc = service(&transport);
    assert!(matches!(svc.login(&creds(None)).await, Err(ClientError::Network(_))));
}

#[tokio::test]
async fn logout_during_login_discards_late_response() {
    let store = Arc::new(SessionStore::in_memory());
    let store_for_hook = Arc::clone(&store);
    let response = login_ok("staff").unwrap();
    let transport: Arc<dyn Transport> = Arc::new(InterruptingTransport {
        during_send: Box::new(move || store_for_hook.clear()),
        response,
    });
    let svc = AuthService::new(transport, Arc::clone(&store), Endpoints::parse(API).unwrap());

    let err = svc.login(&creds(Some(Role::Staff))).await.unwrap_err();
    assert!(matches!(err, ClientError::Superseded));
    assert!(!store.is_authenticated());
    assert_eq!(store.access_token(), None);
}
