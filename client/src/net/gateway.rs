//! API gateway client.
//!
//! DESIGN
//! ======
//! One cloneable handle wraps the transport and the notifier. Typed helpers
//! (`get`, `post`, `put`, `delete`) serialize bodies, unwrap the optional
//! `{ "data": ... }` envelope, and decode into the caller's type.
//!
//! ERROR HANDLING
//! ==============
//! Every failed request is mapped to a [`ClientError`] and reported to the
//! notifier exactly once, here. Callers only decide what to do next; they
//! never build error toasts for transport or server failures themselves.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::ClientError;
use crate::notify::{Notification, Notifier};

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        Self { transport, notifier }
    }

    /// Push a notification through the same sink the gateway reports to.
    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // =========================================================================
    // TYPED HELPERS
    // =========================================================================

    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport, status, or decode failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_with_query(path, Vec::new()).await
    }

    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport, status, or decode failure.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ClientError> {
        let value = self
            .execute(ApiRequest::new(Method::Get, path).with_query(query))
            .await?;
        self.decode(value)
    }

    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport, status, or decode failure.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let value = self.send_json(Method::Post, path, body).await?;
        self.decode(value)
    }

    /// POST whose response body is not needed.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport or status failure.
    pub async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send_json(Method::Post, path, body).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport, status, or decode failure.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let value = self.send_json(Method::Put, path, body).await?;
        self.decode(value)
    }

    /// # Errors
    ///
    /// Returns the mapped [`ClientError`] on transport or status failure.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute(ApiRequest::new(Method::Delete, path)).await.map(|_| ())
    }

    // =========================================================================
    // CORE
    // =========================================================================

    /// Send `body` as JSON and return the raw response body on a 2xx status.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`], plus [`ClientError::Decode`] when `body` cannot
    /// be serialized.
    pub async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<Value, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| self.fail(method, path, ClientError::Decode(e.to_string())))?;
        self.execute(ApiRequest::new(method, path).with_body(body)).await
    }

    /// Send a request and return the response body on a 2xx status.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoResponse`] when the transport fails and
    /// [`ClientError::Server`] for non-2xx statuses. Both are notified.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let method = request.method;
        let path = request.path.clone();
        debug!(method = method.as_str(), %path, "api request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(method, &path, ClientError::NoResponse(e.0))),
        };

        if response.is_success() {
            return Ok(response.body);
        }
        Err(self.fail(method, &path, server_error(&response)))
    }

    fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, ClientError> {
        decode_payload(value).map_err(|e| {
            if let Some(notification) = e.notification() {
                self.notifier.notify(notification);
            }
            e
        })
    }

    fn fail(&self, method: Method, path: &str, error: ClientError) -> ClientError {
        warn!(method = method.as_str(), %path, code = crate::error::ErrorCode::error_code(&error), error = %error, "api request failed");
        if let Some(notification) = error.notification() {
            self.notifier.notify(notification);
        }
        error
    }
}

// =============================================================================
// PAYLOAD HELPERS
// =============================================================================

/// Decode the `data` field of an envelope when present, otherwise the bare
/// payload. An envelope whose `data` does not fit falls back to the whole
/// body.
pub(crate) fn decode_payload<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    let envelope = match &value {
        Value::Object(map) => map.get("data").cloned(),
        _ => None,
    };
    if let Some(inner) = envelope {
        if let Ok(decoded) = serde_json::from_value::<T>(inner) {
            return Ok(decoded);
        }
    }
    serde_json::from_value::<T>(value).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Build a server error from a non-2xx response, preferring the server's text.
pub(crate) fn server_error(response: &ApiResponse) -> ClientError {
    let message = match &response.body {
        Value::Object(map) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(ToOwned::to_owned),
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    };
    ClientError::Server {
        status: response.status,
        message: message.unwrap_or_else(|| format!("Request failed with status {}", response.status)),
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;
