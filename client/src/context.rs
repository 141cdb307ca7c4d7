//! Explicit application context handed to every controller.
//!
//! Controllers never read a global store: what they need (gateway, session)
//! comes in through [`AppContext`].

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::gateway::ApiClient;
use crate::net::transport::{HttpTransport, TransportError};
use crate::notify::Notifier;

/// The site the user is working on, when one is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub site_id: Option<String>,
}

#[derive(Clone)]
pub struct AppContext {
    pub api: ApiClient,
    pub session: Session,
}

impl AppContext {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self { api, session }
    }

    /// Wire a real HTTP gateway from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be built.
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config)?;
        let api = ApiClient::new(Arc::new(transport), notifier);
        let session = Session { site_id: config.site_id.clone() };
        Ok(Self::new(api, session))
    }
}
