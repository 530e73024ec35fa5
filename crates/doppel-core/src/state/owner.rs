//! Single owner of persisted application state.
//!
//! Every read goes through a lenient load (absent or malformed documents
//! normalize to defaults) and every mutation runs as load-modify-save
//! under one async lock, so concurrent writers cannot lose updates.
//! Engines receive `Arc<StateOwner<_>>` and never touch the store keys
//! directly.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use doppel_types::decision::DecisionRecord;
use doppel_types::error::StoreError;
use doppel_types::live::LiveRecord;
use doppel_types::profile::{Profile, ProfileCategory};
use doppel_types::twin::{GalleryItem, PointsLedger, TodoItem};

use crate::storage::KvStore;

/// Well-known store keys, one JSON document per domain.
pub mod keys {
    pub const PROFILE: &str = "profile";
    pub const SESSIONS: &str = "sessions";
    pub const DECISIONS: &str = "decisions";
    pub const LIVE_SESSIONS: &str = "live_sessions";
    pub const TODOS: &str = "todos";
    pub const POINTS: &str = "points";
    pub const GALLERY: &str = "gallery";
}

pub struct StateOwner<K> {
    store: Arc<K>,
    write_lock: Mutex<()>,
}

impl<K: KvStore> StateOwner<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Load a document, normalizing absent or unreadable data to default.
    async fn load<T>(&self, key: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        match self.store.get(key).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(parsed) => Ok(parsed),
                Err(err) => {
                    tracing::warn!(key, error = %err, "Stored document unreadable, using default");
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, serde_json::to_value(value)?).await
    }

    // ---- profile ----

    /// The current profile, sanitized.
    pub async fn profile(&self) -> Result<Profile, StoreError> {
        Ok(self.load::<Profile>(keys::PROFILE).await?.sanitize())
    }

    /// Replace the whole profile. Sanitizes and stamps `updated_at`.
    pub async fn replace_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store_profile(profile).await
    }

    /// Load-modify-save the profile under the write lock.
    pub async fn update_profile<F>(&self, mutate: F) -> Result<Profile, StoreError>
    where
        F: FnOnce(&mut Profile),
    {
        let _guard = self.write_lock.lock().await;
        let mut profile = self.load::<Profile>(keys::PROFILE).await?.sanitize();
        mutate(&mut profile);
        self.store_profile(profile).await
    }

    pub async fn add_profile_entry(
        &self,
        category: ProfileCategory,
        entry: &str,
    ) -> Result<Profile, StoreError> {
        let entry = entry.to_string();
        self.update_profile(|profile| profile.entries_mut(category).push(entry))
            .await
    }

    pub async fn remove_profile_entry(
        &self,
        category: ProfileCategory,
        entry: &str,
    ) -> Result<Profile, StoreError> {
        self.update_profile(|profile| {
            profile
                .entries_mut(category)
                .retain(|existing| existing != entry)
        })
        .await
    }

    async fn store_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut profile = profile.sanitize();
        profile.updated_at = Some(Utc::now());
        self.save(keys::PROFILE, &profile).await?;
        Ok(profile)
    }

    // ---- decisions ----

    pub async fn decisions(&self) -> Result<Vec<DecisionRecord>, StoreError> {
        self.load(keys::DECISIONS).await
    }

    pub async fn push_decision(&self, record: DecisionRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<DecisionRecord> = self.load(keys::DECISIONS).await?;
        records.push(record);
        self.save(keys::DECISIONS, &records).await
    }

    // ---- live session records ----

    pub async fn live_records(&self) -> Result<Vec<LiveRecord>, StoreError> {
        self.load(keys::LIVE_SESSIONS).await
    }

    pub async fn push_live_record(&self, record: LiveRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<LiveRecord> = self.load(keys::LIVE_SESSIONS).await?;
        records.push(record);
        self.save(keys::LIVE_SESSIONS, &records).await
    }

    // ---- todos ----

    pub async fn todos(&self) -> Result<Vec<TodoItem>, StoreError> {
        self.load(keys::TODOS).await
    }

    /// Append one todo per text, in order. Returns the created items.
    pub async fn add_todos(&self, texts: Vec<String>) -> Result<Vec<TodoItem>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut todos: Vec<TodoItem> = self.load(keys::TODOS).await?;
        let created: Vec<TodoItem> = texts.into_iter().map(TodoItem::new).collect();
        todos.extend(created.iter().cloned());
        self.save(keys::TODOS, &todos).await?;
        Ok(created)
    }

    /// Mark a todo done or not done. Returns false when the id is unknown.
    pub async fn set_todo_done(&self, id: Uuid, done: bool) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut todos: Vec<TodoItem> = self.load(keys::TODOS).await?;
        let Some(todo) = todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(false);
        };
        todo.done = done;
        self.save(keys::TODOS, &todos).await?;
        Ok(true)
    }

    /// Drop completed todos. Returns how many were removed.
    pub async fn clear_done_todos(&self) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut todos: Vec<TodoItem> = self.load(keys::TODOS).await?;
        let before = todos.len();
        todos.retain(|todo| !todo.done);
        let removed = before - todos.len();
        if removed > 0 {
            self.save(keys::TODOS, &todos).await?;
        }
        Ok(removed)
    }

    // ---- points ----

    pub async fn points(&self) -> Result<PointsLedger, StoreError> {
        self.load(keys::POINTS).await
    }

    pub async fn award_points(&self, reason: &str, delta: i64) -> Result<PointsLedger, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ledger: PointsLedger = self.load(keys::POINTS).await?;
        ledger.award(reason, delta);
        self.save(keys::POINTS, &ledger).await?;
        Ok(ledger)
    }

    // ---- gallery ----

    pub async fn gallery(&self) -> Result<Vec<GalleryItem>, StoreError> {
        self.load(keys::GALLERY).await
    }

    pub async fn push_gallery_item(&self, item: GalleryItem) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<GalleryItem> = self.load(keys::GALLERY).await?;
        items.push(item);
        self.save(keys::GALLERY, &items).await
    }
}
