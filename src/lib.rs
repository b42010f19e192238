//! Session core for the STOCKED restaurant inventory client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every role dashboard (admin, manager, staff, supplier) sits behind the same
//! login flow. This crate owns that flow: the persisted session, the auth
//! service that fills it, the reactive auth context the pages read, the route
//! gate, and the HTTP wrapper that keeps bearer tokens fresh.
//!
//! DESIGN
//! ======
//! Nothing here is global. The binary builds one [`session::SessionStore`] at
//! start-up, wraps it in `Arc`, and hands it to the service, the context and
//! the API client explicitly.

pub mod config;
pub mod error;
pub mod models;
pub mod net;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::ClientConfig;
pub use error::{ClientError, ErrorCode, StorageError};
pub use models::{Credentials, Role, User};
