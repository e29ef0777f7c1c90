//! # Error Types
//!
//! Unified error handling for the quadrant-core library.
//!
//! The taxonomy mirrors how failures are handled at the store boundary:
//! `Unauthorized` is routed to the session controller, `Validation` aborts
//! before any network call, and everything else surfaces as a store-level
//! error message.

use thiserror::Error;

/// Library-wide result type
pub type QuadrantResult<T> = Result<T, QuadrantError>;

/// Error types for boundary and store operations
#[derive(Debug, Error)]
pub enum QuadrantError {
    /// The bearer credential was rejected or is missing. Routed to the
    /// session controller rather than shown as a generic error.
    #[error("unauthorized: credential rejected by the task service")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("task service error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid session transition: {from} cannot accept {event}")]
    InvalidTransition { from: String, event: String },
}

impl QuadrantError {
    /// Create an API error from an HTTP response
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check whether this failure must be routed to the session controller
    /// instead of the store-level error banner.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
