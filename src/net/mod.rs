//! Backend HTTP access.

pub mod api;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use api::ApiClient;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
