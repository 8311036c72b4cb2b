//! Redis session store
//!
//! - Key: `prefix + session_id` (default prefix: "sess:")
//! - Value: JSON serialized [`SessionRecord`]
//! - TTL: derived from the record's `expire`; records without one never expire

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::SessionStore;
use crate::error::{SessionError, SessionResult};
use crate::record::SessionRecord;

/// Redis session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_sliding_session::RedisStore;
///
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(client).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store with the default "sess:" prefix
    pub async fn new(client: redis::Client) -> SessionResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> SessionResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::store(format!("failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "sess:".to_string(),
        }
    }

    /// Build with custom key prefix
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn make_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }

    async fn write(&self, sid: &str, record: &SessionRecord) -> SessionResult<()> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();
        let json = serde_json::to_string(record)?;

        match record.remaining_secs(Utc::now()) {
            // Plain SET also drops any TTL left over from an earlier write.
            None => conn.set::<_, _, ()>(&key, &json).await?,
            Some(secs) if secs > 0 => conn.set_ex::<_, _, ()>(&key, &json, secs as u64).await?,
            Some(_) => conn.del::<_, ()>(&key).await?,
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn create_session(&self, sid: &str, record: &SessionRecord) -> SessionResult<()> {
        self.write(sid, record).await
    }

    async fn get_session_by_id(&self, sid: &str) -> SessionResult<Option<SessionRecord>> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        let data: Option<String> = conn.get(&key).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn persist_session_data(&self, sid: &str, record: &SessionRecord) -> SessionResult<()> {
        self.write(sid, record).await
    }

    async fn delete_session(&self, sid: &str) -> SessionResult<()> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        conn.del::<_, ()>(&key).await?;
        Ok(())
    }
}
