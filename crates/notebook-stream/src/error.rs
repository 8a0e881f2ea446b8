//! Error types for notebook client operations

use thiserror::Error;

/// Result type alias for notebook client operations
pub type Result<T> = std::result::Result<T, NotebookClientError>;

/// Errors raised while setting up a client
///
/// Failures of a running stream are not errors: they arrive as `error`
/// events on the stream's sink.
#[derive(Error, Debug)]
pub enum NotebookClientError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
