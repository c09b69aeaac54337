//! Storage contract for Cove.
//!
//! This crate defines the [`VaultStore`] trait — a record-level persistence
//! interface keyed by project key. Values are opaque JSON documents; this
//! layer knows nothing about products, secrets, or encryption. Every secret
//! value inside a record is encrypted by `cove-core` before it reaches a
//! store implementation.
//!
//! Two implementations are provided:
//!
//! - [`PostgresBackend`] — production default, backed by PostgreSQL
//!   (feature `postgres-backend`)
//! - [`MemoryBackend`] — in-memory, for testing and development

mod error;
mod memory;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;

pub use error::StoreError;
pub use memory::MemoryBackend;
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresBackend;

/// A pluggable vault record store.
///
/// One record per project key. The project key doubles as the caller's KDF
/// password, so implementations must never echo it into error messages or
/// logs — see [`StoreError`].
///
/// [`create`](VaultStore::create) and [`save`](VaultStore::save) are
/// deliberately distinct: create inserts and fails on an existing record,
/// save overwrites. The core issues at most one read and one write per
/// mutation; no transaction spans them.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait VaultStore: Send + Sync + 'static {
    /// Retrieve the record for a project key.
    ///
    /// Returns `Ok(None)` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the underlying backend fails.
    async fn get(&self, project_key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Insert a new record. Fails if a record already exists for the key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the project key is already taken,
    /// [`StoreError::Write`] if the underlying backend fails.
    async fn create(&self, project_key: &str, record: &serde_json::Value)
        -> Result<(), StoreError>;

    /// Overwrite the record for a project key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the underlying backend fails.
    async fn save(&self, project_key: &str, record: &serde_json::Value)
        -> Result<(), StoreError>;
}
