//! Session collection over the key/value store.
//!
//! All sessions live as one JSON array under the `sessions` key, in
//! insertion order. Deletion is a soft state flip; purge permanently
//! drops everything in the trash. `save` upserts by id and never
//! resurrects a trashed session: the stored lifecycle state wins over
//! whatever the caller's copy carries.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use doppel_types::error::{SessionError, StoreError};
use doppel_types::session::{Session, SessionKind, SessionState};

use crate::state::keys;
use crate::storage::KvStore;

/// Which slice of the collection to list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    pub kind: Option<SessionKind>,
    pub deleted: Option<bool>,
}

impl SessionFilter {
    /// Active sessions only (the default surface).
    pub fn active() -> Self {
        Self {
            kind: None,
            deleted: Some(false),
        }
    }

    /// Trashed sessions only.
    pub fn trash() -> Self {
        Self {
            kind: None,
            deleted: Some(true),
        }
    }

    pub fn with_kind(mut self, kind: SessionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn matches(&self, session: &Session) -> bool {
        if let Some(kind) = self.kind {
            if session.kind != kind {
                return false;
            }
        }
        if let Some(deleted) = self.deleted {
            if session.state.is_deleted() != deleted {
                return false;
            }
        }
        true
    }
}

pub struct SessionStore<K> {
    store: Arc<K>,
    write_lock: Mutex<()>,
}

impl<K: KvStore> SessionStore<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        match self.store.get(keys::SESSIONS).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(sessions) => Ok(sessions),
                Err(err) => {
                    tracing::warn!(error = %err, "Stored sessions unreadable, starting empty");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, sessions: &[Session]) -> Result<(), StoreError> {
        self.store
            .set(keys::SESSIONS, serde_json::to_value(sessions)?)
            .await
    }

    /// Fetch one session by id, deleted or not.
    pub async fn get(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.load_all().await?.into_iter().find(|s| s.id == id))
    }

    /// Insert or update a session by id.
    ///
    /// On update the stored lifecycle state is preserved, so saving a
    /// stale copy cannot silently restore a deleted session.
    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.load_all().await?;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                let stored_state = existing.state;
                *existing = session.clone();
                existing.state = stored_state;
            }
            None => sessions.push(session.clone()),
        }
        self.persist(&sessions).await
    }

    /// Move a session to the trash. Idempotent for already-deleted ones.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.load_all().await?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::NotFound(id))?;
        if !session.state.is_deleted() {
            session.state = SessionState::Deleted {
                deleted_at: Utc::now(),
            };
        }
        self.persist(&sessions).await?;
        Ok(())
    }

    /// Bring a trashed session back, log intact.
    pub async fn restore(&self, id: Uuid) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.load_all().await?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::NotFound(id))?;
        session.state = SessionState::Active;
        self.persist(&sessions).await?;
        Ok(())
    }

    /// Permanently remove everything in the trash. Returns the count.
    pub async fn purge_deleted(&self) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.load_all().await?;
        let before = sessions.len();
        sessions.retain(|s| !s.state.is_deleted());
        let removed = before - sessions.len();
        if removed > 0 {
            self.persist(&sessions).await?;
        }
        Ok(removed)
    }

    /// List sessions matching `filter`, in insertion order.
    pub async fn list(&self, filter: SessionFilter) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect())
    }
}
