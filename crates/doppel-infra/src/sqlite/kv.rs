//! SQLite key-value store implementation.
//!
//! Implements `KvStore` from `doppel-core` using sqlx with split read/write
//! pools. Values are stored as JSON text and deserialized on read.

use chrono::Utc;
use sqlx::Row;

use doppel_core::storage::KvStore;
use doppel_types::error::StoreError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `KvStore`.
pub struct SqliteKvStore {
    pool: DatabasePool,
}

impl SqliteKvStore {
    /// Create a new KV store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match row {
            Some(row) => {
                let value_str: String = row
                    .try_get("value")
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                let value: serde_json::Value = serde_json::from_str(&value_str)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(&value)?;

        sqlx::query(
            r#"INSERT INTO kv_store (key, value, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(&value_str)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = SqliteKvStore::new(test_pool().await);

        let value = serde_json::json!({"values": ["honesty"], "interests": []});
        store.set("profile", value.clone()).await.unwrap();

        let got = store.get("profile").await.unwrap();
        assert_eq!(got, Some(value));
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = SqliteKvStore::new(test_pool().await);

        let got = store.get("missing").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let store = SqliteKvStore::new(test_pool().await);

        store.set("points", serde_json::json!(1)).await.unwrap();
        store.set("points", serde_json::json!(2)).await.unwrap();

        let got = store.get("points").await.unwrap();
        assert_eq!(got, Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SqliteKvStore::new(test_pool().await);

        store.set("temp", serde_json::json!("value")).await.unwrap();
        store.remove("temp").await.unwrap();

        let got = store.get("temp").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_noop() {
        let store = SqliteKvStore::new(test_pool().await);

        // Should not error
        store.remove("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_json_value_types() {
        let store = SqliteKvStore::new(test_pool().await);

        store.set("string", serde_json::json!("hello")).await.unwrap();
        assert_eq!(
            store.get("string").await.unwrap(),
            Some(serde_json::json!("hello"))
        );

        store.set("number", serde_json::json!(42)).await.unwrap();
        assert_eq!(
            store.get("number").await.unwrap(),
            Some(serde_json::json!(42))
        );

        store.set("array", serde_json::json!([1, "two", 3])).await.unwrap();
        assert_eq!(
            store.get("array").await.unwrap(),
            Some(serde_json::json!([1, "two", 3]))
        );

        store
            .set("nested", serde_json::json!({"a": {"b": {"c": true}}}))
            .await
            .unwrap();
        assert_eq!(
            store.get("nested").await.unwrap(),
            Some(serde_json::json!({"a": {"b": {"c": true}}}))
        );
    }

    #[tokio::test]
    async fn test_state_owner_over_sqlite() {
        use doppel_core::state::StateOwner;
        use std::sync::Arc;

        let owner = StateOwner::new(Arc::new(SqliteKvStore::new(test_pool().await)));

        owner
            .add_profile_entry(doppel_types::profile::ProfileCategory::Values, "honesty")
            .await
            .unwrap();

        let profile = owner.profile().await.unwrap();
        assert_eq!(profile.values, vec!["honesty"]);
    }
}
