//! Protected route gate.
//!
//! A pure decision over the auth state and the roles a page allows. The
//! caller performs whatever navigation the decision asks for.

use crate::models::Role;
use crate::state::auth::AuthState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Auth context is still initializing; show a loading indicator.
    Loading,
    RedirectToLogin,
    RedirectToUnauthorized,
    Render,
}

/// Decide whether a page allowing `allowed` roles may render.
///
/// An empty `allowed` set admits any authenticated user. An admin satisfies
/// every set, matching the login policy that lets admins act as any role.
#[must_use]
pub fn guard(loading: bool, is_authenticated: bool, role: Option<Role>, allowed: &[Role]) -> GateDecision {
    if loading {
        return GateDecision::Loading;
    }
    if !is_authenticated {
        return GateDecision::RedirectToLogin;
    }
    if allowed.is_empty() {
        return GateDecision::Render;
    }
    match role {
        Some(Role::Admin) => GateDecision::Render,
        Some(role) if allowed.contains(&role) => GateDecision::Render,
        _ => GateDecision::RedirectToUnauthorized,
    }
}

/// [`guard`] applied to an auth context snapshot.
#[must_use]
pub fn guard_state(state: &AuthState, allowed: &[Role]) -> GateDecision {
    guard(state.loading, state.is_authenticated, state.user.as_ref().map(|u| u.role), allowed)
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
