//! Error types for devreg

use std::time::Duration;
use thiserror::Error;

/// Result type alias for devreg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the harness
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while resolving, signing, or executing a request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "No usable credentials found. Export AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and AWS_SESSION_TOKEN, or refresh ~/.aws/credentials."
    )]
    MissingCredentials,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {actual} (expected {expected}): {body}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },
}

impl ApiError {
    /// Build a timeout error from a millisecond limit.
    pub fn timeout_ms(timeout_ms: u64) -> Self {
        ApiError::RequestTimeout(Duration::from_millis(timeout_ms))
    }
}

/// Transport failure from reqwest. Timeouts are mapped by the executor,
/// which knows the limit it applied.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Keep the whole cause chain (DNS, TLS, reset) in the message
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ApiError::Transport(message)
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid stage name: {0:?}")]
    InvalidStage(String),

    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
