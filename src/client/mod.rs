//! Configuration API client.
//!
//! This module provides the [`ConfigApi`] seam used by the lifecycle code and
//! its HTTP implementation against `{https_host}/config/v2`.

mod api;
mod endpoint;
mod http;

pub use api::ConfigApi;
#[cfg(test)]
pub use api::MockConfigApi;
pub use endpoint::Endpoint;
pub use http::ConfigApiClient;
