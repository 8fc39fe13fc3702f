//! Error types for the tunnelhook core library.

use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for tunnelhook operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Converting a payload to its canonical form failed
    #[error("Failed to serialize payload to canonical form: {0}")]
    Serialization(#[source] serde_json::Error),
}
