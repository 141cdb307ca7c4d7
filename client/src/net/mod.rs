//! Network layer: transport seam, gateway client, and typed endpoints.

pub mod api;
pub mod gateway;
pub mod transport;

pub use gateway::ApiClient;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport, TransportError};

/// Percent-encode one path segment so an id cannot change the request target.
#[must_use]
pub fn encode_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
