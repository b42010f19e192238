//! Client-side reactive state.

pub mod auth;

pub use auth::{AuthContext, AuthState};
