//! Error types for the duplicate detection service.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while talking to collaborators of the engine.
///
/// The matching algorithm itself is total and never produces one of these;
/// they only appear around the optional AI review and configuration loading.
#[derive(Error, Debug)]
pub enum EngineError {
    /// HTTP transport error from the completion provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    /// Provider answered but the payload was not usable
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider did not answer in time
    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
