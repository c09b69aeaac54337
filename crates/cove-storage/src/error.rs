//! Storage error types.
//!
//! Variants carry the failure reason but never the project key: the project
//! key is also the caller's KDF password, and these messages end up in logs
//! and HTTP responses.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to open or connect to the backing store.
    #[error("failed to open store at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a vault record.
    #[error("failed to read vault record: {reason}")]
    Read { reason: String },

    /// Failed to write a vault record.
    #[error("failed to write vault record: {reason}")]
    Write { reason: String },

    /// A record already exists for the project key.
    #[error("a vault already exists for this project key")]
    Conflict,
}
