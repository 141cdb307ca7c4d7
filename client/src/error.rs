//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Three kinds of failure reach a user:
//! - the server answered with a non-2xx status and (usually) a message,
//! - the request never got a response,
//! - the input was rejected locally before any request was sent.
//!
//! The first two become destructive notifications (see `notify`); local
//! validation stays field-level so forms can render it inline. Every error
//! is terminal for the action that raised it. Nothing here retries.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::collections::BTreeMap;
use std::fmt;

use crate::notify::Notification;

/// Generic message shown when a request produced no response at all.
pub const NO_RESPONSE_MESSAGE: &str = "No response from server";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error codes, one per variant.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;

    /// Whether a user resubmitting the same action could plausibly succeed.
    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// FIELD ERRORS
// =============================================================================

/// Field-level validation messages keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            let Some(first) = list.first() else {
                continue;
            };
            let message = first
                .message
                .as_ref()
                .map_or_else(|| format!("invalid value ({})", first.code), ToString::to_string);
            out.add(wire_field_name(field), message);
        }
        out
    }
}

/// Translate a Rust field name to its camelCase wire name.
fn wire_field_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// =============================================================================
// CLIENT ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request was sent but no response came back.
    #[error("No response from server: {0}")]
    NoResponse(String),

    /// Local validation rejected the input; no request was sent.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The response body did not match the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(String),

    /// A record was not present in the local store.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Local draft storage could not be read or written.
    #[error("draft storage failed: {0}")]
    Drafts(String),
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Server { .. } => "E_SERVER",
            Self::NoResponse(_) => "E_NO_RESPONSE",
            Self::Validation(_) => "E_VALIDATION",
            Self::Decode(_) => "E_DECODE",
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Drafts(_) => "E_DRAFTS",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::NoResponse(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}

impl ClientError {
    /// The notification a user should see for this error, if any.
    ///
    /// Validation errors render inline and produce no notification.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::Server { message, .. } => Some(Notification::destructive("Error", message.clone())),
            Self::NoResponse(_) => Some(Notification::destructive("Error", NO_RESPONSE_MESSAGE)),
            Self::Decode(detail) => Some(Notification::destructive("Error", detail.clone())),
            Self::Drafts(detail) => Some(Notification::destructive("Draft storage", detail.clone())),
            Self::Validation(_) | Self::NotFound { .. } => None,
        }
    }

    /// Field errors when this is a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Server { status: 409, .. })
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}
