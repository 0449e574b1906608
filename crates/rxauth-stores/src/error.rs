//! Error types for rxauth-stores

use thiserror::Error;

/// Errors that can occur in the data store layer.
///
/// "Record not found" is NOT an error here: lookups return
/// `Result<Option<T>, StoreError>` so callers can distinguish a legitimate
/// miss from an infrastructure failure without inspecting error types.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store unreachable or unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Query against the backing store failed
    #[error("Store query failed: {0}")]
    Query(String),

    /// Attempt to insert a second record for an already-indexed key
    #[error("Duplicate record for key: {0}")]
    Duplicate(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
