//! Shared fixtures for unit tests: a scripted transport and ready-made
//! gateway/context handles wired to an in-memory notification center.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::context::{AppContext, Session};
use crate::net::gateway::ApiClient;
use crate::net::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use crate::notify::NotificationCenter;

#[derive(Clone)]
pub enum Scripted {
    Respond(u16, Value),
    Unreachable,
    /// Respond after sleeping, so callers can observe requests in flight.
    Delayed(Duration, u16, Value),
}

/// Transport that answers from a script keyed by `"METHOD /path"`.
///
/// Each key holds a queue; the last entry is reused once the queue would
/// become empty. Unscripted requests answer 404.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<String, Vec<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, reply: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(key(method, path))
            .or_default()
            .push(reply);
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.on(method, path, Scripted::Respond(status, body));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

fn key(method: Method, path: &str) -> String {
    format!("{} {path}", method.as_str())
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(&key(request.method, &request.path)) {
                Some(queue) if queue.len() > 1 => Some(queue.remove(0)),
                Some(queue) => queue.first().cloned(),
                None => None,
            }
        };
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(Scripted::Respond(status, body)) => Ok(ApiResponse { status, body }),
            Some(Scripted::Delayed(delay, status, body)) => {
                tokio::time::sleep(delay).await;
                Ok(ApiResponse { status, body })
            }
            Some(Scripted::Unreachable) => Err(TransportError("connection refused".into())),
            None => Ok(ApiResponse { status: 404, body: serde_json::json!({ "message": "Not found" }) }),
        }
    }
}

pub fn api_with(transport: &Arc<MockTransport>) -> (ApiClient, Arc<NotificationCenter>) {
    let notices = Arc::new(NotificationCenter::new());
    let api = ApiClient::new(transport.clone(), notices.clone());
    (api, notices)
}

pub fn context_with(transport: &Arc<MockTransport>) -> (AppContext, Arc<NotificationCenter>) {
    let (api, notices) = api_with(transport);
    (AppContext::new(api, Session::default()), notices)
}
