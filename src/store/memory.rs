//! In-memory session store
//!
//! This is primarily for development and testing.
//! For production, use RedisStore or another persistent store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::SessionStore;
use crate::error::SessionResult;
use crate::record::SessionRecord;

struct StoredSession {
    record: SessionRecord,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    fn new(record: &SessionRecord) -> Self {
        Self {
            record: record.clone(),
            expires_at: record.metadata.expire,
        }
    }

    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// In-memory session store
///
/// Clones share the same underlying map. Expired entries are handed back as-is
/// by `get_session_by_id` (the engine decides what to do with them). They are
/// swept whenever a session is created, and on [`MemoryStore::cleanup_expired`].
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
/// - Memory usage grows with number of sessions
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose expiration has passed
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.sessions.write().retain(|_, stored| stored.is_live_at(now));
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.cleanup_expired();
        self.sessions.read().len()
    }

    /// Whether no live session is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists for `sid`, expired or not
    pub fn contains(&self, sid: &str) -> bool {
        self.sessions.read().contains_key(sid)
    }

    /// Remove all sessions
    pub fn clear(&self) {
        self.sessions.write().clear();
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, sid: &str, record: &SessionRecord) -> SessionResult<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        sessions.retain(|_, stored| stored.is_live_at(now));
        sessions.insert(sid.to_string(), StoredSession::new(record));
        Ok(())
    }

    async fn get_session_by_id(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        Ok(self
            .sessions
            .read()
            .get(sid)
            .map(|stored| stored.record.clone()))
    }

    async fn persist_session_data(&self, sid: &str, record: &SessionRecord) -> SessionResult<()> {
        self.sessions
            .write()
            .insert(sid.to_string(), StoredSession::new(record));
        Ok(())
    }

    async fn delete_session(&self, sid: &str) -> SessionResult<()> {
        self.sessions.write().remove(sid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        let mut record = SessionRecord::new(Utc::now(), Some(Duration::hours(1)));
        record.attributes.insert("user".into(), json!("alice"));

        store.create_session("test-id", &record).await.unwrap();

        let retrieved = store.get_session_by_id("test-id").await.unwrap();
        assert_eq!(retrieved, Some(record.clone()));

        record.attributes.insert("user".into(), json!("bob"));
        store.persist_session_data("test-id", &record).await.unwrap();
        let retrieved = store.get_session_by_id("test-id").await.unwrap().unwrap();
        assert_eq!(retrieved.attributes.get("user"), Some(&json!("bob")));

        store.delete_session("test-id").await.unwrap();
        assert!(store.get_session_by_id("test-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_and_repeated_delete() {
        let store = MemoryStore::new();
        assert!(store.get_session_by_id("nope").await.unwrap().is_none());
        store.delete_session("nope").await.unwrap();
        store.delete_session("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_expiry_sweep() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .create_session("fresh", &SessionRecord::new(now, Some(Duration::hours(1))))
            .await
            .unwrap();
        store
            .create_session("forever", &SessionRecord::new(now, None))
            .await
            .unwrap();
        let mut expired = SessionRecord::new(now, None);
        expired.metadata.expire = Some(now - Duration::seconds(1));
        store.create_session("old", &expired).await.unwrap();

        assert!(store.contains("old"));
        assert_eq!(store.len(), 2);
        assert!(!store.contains("old"));
        assert!(store.contains("fresh"));
        assert!(store.contains("forever"));
    }

    #[tokio::test]
    async fn test_abandoned_sessions_reclaimed_on_create() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut abandoned = SessionRecord::new(now - Duration::hours(2), None);
        abandoned.metadata.expire = Some(now - Duration::hours(1));
        store.create_session("abandoned", &abandoned).await.unwrap();

        // Still handed back until something sweeps it.
        assert_eq!(
            store.get_session_by_id("abandoned").await.unwrap(),
            Some(abandoned)
        );

        store
            .create_session("next", &SessionRecord::new(now, Some(Duration::hours(1))))
            .await
            .unwrap();
        assert!(!store.contains("abandoned"));
        assert!(store.contains("next"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .create_session("shared", &SessionRecord::new(Utc::now(), None))
            .await
            .unwrap();
        assert!(other.contains("shared"));

        other.clear();
        assert!(store.is_empty());
    }
}
