//! Error types for `tagplay` core library.

use thiserror::Error;

/// Result type alias using `tagplay` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `tagplay` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
