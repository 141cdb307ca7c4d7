//! HTTP transport seam.
//!
//! The gateway speaks to the server only through [`Transport`], so tests and
//! alternate front-ends can swap the wire without touching controller logic.
//! [`HttpTransport`] is the real implementation over `reqwest`.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::warn;

use crate::config::ClientConfig;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A request relative to the API root (`/api`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path beginning with `/`, e.g. `/sites/s1`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status plus parsed JSON body. Empty or non-JSON bodies become `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (connect failure, timeout, ...).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever status the server answered with.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no response was received; non-2xx
    /// statuses are returned as a normal [`ApiResponse`].
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

// =============================================================================
// REQWEST IMPLEMENTATION
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    api_root: String,
}

impl HttpTransport {
    /// Build a transport with the common headers and timeouts from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// underlying client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportError(format!("invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| TransportError(format!("HTTP client build failed: {e}")))?;

        Ok(Self { http, api_root: config.api_root() })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.api_root, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let builder = self.http.request(method, &url);
        let builder = if request.query.is_empty() { builder } else { builder.query(&request.query) };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        Ok(read_response(status, response.text().await))
    }
}

/// Build the response once a status has arrived. A body that fails to read
/// leaves the status standing with a `Null` body, so a confirmed write is
/// never reported as unanswered.
fn read_response<E: std::fmt::Display>(status: u16, text: Result<String, E>) -> ApiResponse {
    let body = match text {
        Ok(text) if text.trim().is_empty() => Value::Null,
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(e) => {
            warn!(status, error = %e, "response body could not be read");
            Value::Null
        }
    };
    ApiResponse { status, body }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;
