//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Non-positive capacity or TTL, or an unrecognised option value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key is present but its TTL elapsed before the read
    #[error("Key expired: {0}")]
    Expired(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying item store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// No Tokio runtime was available to host the background sweep
    #[error("A Tokio runtime is required to start the background sweep")]
    NoRuntime,
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
