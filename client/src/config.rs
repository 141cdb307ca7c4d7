//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DASHBOARD_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_DRAFTS_DIR: &str = ".erp-drafts";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} is not a whole number of seconds")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("invalid base URL {0:?}: expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin without the `/api` suffix and without a trailing slash.
    pub base_url: String,
    pub api_token: Option<String>,
    pub site_id: Option<String>,
    pub timeouts: Timeouts,
    pub dashboard_cache_ttl: Duration,
    pub drafts_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_token: None,
            site_id: None,
            timeouts: Timeouts::default(),
            dashboard_cache_ttl: Duration::from_secs(DEFAULT_DASHBOARD_CACHE_TTL_SECS),
            drafts_dir: PathBuf::from(DEFAULT_DRAFTS_DIR),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `ERP_BASE_URL`: server origin, default `http://127.0.0.1:8080`
    /// - `ERP_API_TOKEN`: bearer token attached to every request
    /// - `ERP_SITE_ID`: active site for the session
    /// - `ERP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ERP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ERP_DASHBOARD_CACHE_TTL_SECS`: default 60
    /// - `ERP_DRAFTS_DIR`: default `.erp-drafts`
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable is malformed or the base URL
    /// is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("ERP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
        )?;
        let timeouts = Timeouts {
            request_secs: env_secs("ERP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_secs("ERP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let ttl = env_secs("ERP_DASHBOARD_CACHE_TTL_SECS", DEFAULT_DASHBOARD_CACHE_TTL_SECS)?;
        let drafts_dir = std::env::var("ERP_DRAFTS_DIR").unwrap_or_else(|_| DEFAULT_DRAFTS_DIR.to_owned());

        Ok(Self {
            base_url,
            api_token: non_empty_env("ERP_API_TOKEN"),
            site_id: non_empty_env("ERP_SITE_ID"),
            timeouts,
            dashboard_cache_ttl: Duration::from_secs(ttl),
            drafts_dir: PathBuf::from(drafts_dir),
        })
    }

    /// Replace the base URL, applying the same normalization as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not http(s).
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn env_secs(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSeconds { var, value }),
        Err(_) => Ok(default),
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
