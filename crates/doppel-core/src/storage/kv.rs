//! Key/value persistence trait.
//!
//! All app state (profile, sessions, decisions, todos, points, gallery)
//! lives under well-known string keys as JSON documents. The SQLite
//! implementation is in doppel-infra; [`MemoryKvStore`] backs tests and
//! ephemeral runs.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

use doppel_types::error::StoreError;

/// Trait for JSON document storage keyed by string.
///
/// Implementations must make each operation atomic with respect to the
/// others; callers layer their own read-modify-write locking on top.
pub trait KvStore: Send + Sync {
    /// Fetch the document at `key`, or `None` if absent.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Insert or replace the document at `key`.
    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete the document at `key`. Deleting an absent key is a no-op.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory [`KvStore`] for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
