//! In-memory vault store for testing.
//!
//! Records live in a `BTreeMap` behind a `RwLock`. Nothing persists — all
//! data is lost when the process exits. Use this for unit and integration
//! tests where you need a real store without touching a database.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StoreError, VaultStore};

/// An in-memory vault store backed by a `BTreeMap`.
///
/// Thread-safe and async-compatible. Enforces the same create/save
/// distinction as the PostgreSQL backend so conflict behavior is testable.
///
/// # Examples
///
/// ```
/// # use cove_storage::{MemoryBackend, VaultStore};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryBackend::new();
/// store.create("pk", &serde_json::json!({"vault_metadata": {}})).await.unwrap();
/// assert!(store.get("pk").await.unwrap().is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<RwLock<BTreeMap<String, serde_json::Value>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VaultStore for MemoryBackend {
    async fn get(&self, project_key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(project_key).cloned())
    }

    async fn create(
        &self,
        project_key: &str,
        record: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(project_key) {
            return Err(StoreError::Conflict);
        }
        records.insert(project_key.to_owned(), record.clone());
        Ok(())
    }

    async fn save(&self, project_key: &str, record: &serde_json::Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(project_key.to_owned(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let store = MemoryBackend::new();
        let result = store.get("missing").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let store = MemoryBackend::new();
        let record = serde_json::json!({"vault_metadata": {"version": 1}});
        store.create("pk", &record).await.unwrap();
        let fetched = store.get("pk").await.unwrap();
        assert_eq!(fetched, Some(record));
    }

    #[tokio::test]
    async fn create_existing_is_conflict() {
        let store = MemoryBackend::new();
        let record = serde_json::json!({});
        store.create("pk", &record).await.unwrap();
        let result = store.create("pk", &record).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn save_overwrites_existing() {
        let store = MemoryBackend::new();
        store.create("pk", &serde_json::json!({"v": 1})).await.unwrap();
        store.save("pk", &serde_json::json!({"v": 2})).await.unwrap();
        let fetched = store.get("pk").await.unwrap();
        assert_eq!(fetched, Some(serde_json::json!({"v": 2})));
    }

    #[tokio::test]
    async fn save_without_create_inserts() {
        let store = MemoryBackend::new();
        store.save("pk", &serde_json::json!({})).await.unwrap();
        assert!(store.get("pk").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn records_are_isolated_by_project_key() {
        let store = MemoryBackend::new();
        store.create("pk1", &serde_json::json!({"a": 1})).await.unwrap();
        store.create("pk2", &serde_json::json!({"b": 2})).await.unwrap();
        assert_eq!(store.get("pk1").await.unwrap(), Some(serde_json::json!({"a": 1})));
        assert_eq!(store.get("pk2").await.unwrap(), Some(serde_json::json!({"b": 2})));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = MemoryBackend::new();
        let clone = store.clone();
        store.create("pk", &serde_json::json!({})).await.unwrap();
        assert!(clone.get("pk").await.unwrap().is_some());
    }
}
