//! Error types for moonbook-core.
//!
//! Applying an operation never fails: inapplicable operations are no-ops.
//! Errors only arise when decoding typed views over untyped metadata.

use thiserror::Error;

/// Result type for moonbook-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in moonbook-core.
#[derive(Debug, Error)]
pub enum Error {
    /// A metadata entry exists but does not have the expected shape.
    #[error("invalid metadata entry '{key}': {source}")]
    InvalidMetadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
