//! Common error types for InboxDrive.

use thiserror::Error;

/// Top-level error type for InboxDrive operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Sign-in or silent token acquisition failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network-level failure or unexpected API response.
    #[error("Network error: {0}")]
    Network(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access denied by the remote API.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Upload of file content failed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
