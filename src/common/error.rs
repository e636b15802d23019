//! Error types for mqgo
//!
//! Messages are meant to be read by whoever runs the tool, so they name the
//! file or endpoint involved and, for remote failures, carry the raw body.

use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mqgo
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {error}")]
    ConfigParse { path: String, error: String },

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Generation Service Errors ===
    #[error("server call failed, status {status}, body:\n{body}")]
    Service { status: u16, body: String },

    #[error("server returned an unusable response ({reason}), status {status}, body:\n{body}")]
    Protocol {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Input Validation Errors ===
    #[error("{0}")]
    Validation(String),

    // === Spec / Plan Errors ===
    #[error("Failed to load spec '{path}': {error}")]
    SpecLoad { path: String, error: String },

    #[error("Failed to load test plan '{path}': {error}")]
    PlanLoad { path: String, error: String },

    #[error("No base URL to send requests to: {0}")]
    BaseUrl(String),

    #[error("Test suite '{0}' not found in the loaded plan")]
    SuiteNotFound(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a file read error for `path`
    pub fn file_read(path: &Path, error: impl ToString) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file write error for `path`
    pub fn file_write(path: &Path, error: impl ToString) -> Self {
        Self::FileWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a protocol error from a response that was received but can't be used
    pub fn protocol(status: u16, reason: impl Into<String>, body: &str) -> Self {
        Self::Protocol {
            status,
            reason: reason.into(),
            body: body.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error is a soft input-validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
