//! Request-scoped session handle

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SessionResult;
use crate::record::SessionRecord;

/// Minimum interval between two rewrites of the `accessed` timestamp
pub const DEFAULT_ACCESS_THROTTLE: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Session wrapper that tracks modifications
///
/// A `Session` is built by the engine at the start of a request, handed to the
/// handler through the depot and reconciled with the store once the handler
/// returns. It owns a working copy of the record; nothing reaches the store
/// until the engine persists it.
pub struct Session {
    /// Session ID
    id: String,

    /// Working copy of the stored record
    record: SessionRecord,

    /// Whether the session was created during this request
    is_new: bool,

    /// Unpersisted mutation pending
    dirty: bool,

    /// Last time `accessed` was materialized
    last_access_update: Option<DateTime<Utc>>,

    /// Throttle window for access-time rewrites
    access_throttle: Duration,
}

impl Session {
    pub(crate) fn new(
        id: String,
        record: SessionRecord,
        is_new: bool,
        access_throttle: std::time::Duration,
    ) -> Self {
        let last_access_update = record.metadata.accessed;
        let access_throttle = Duration::from_std(access_throttle).unwrap_or(Duration::MAX);
        Self {
            id,
            record,
            is_new,
            dirty: false,
            last_access_update,
            access_throttle,
        }
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if this session was created during the current request
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Check if the session has unpersisted changes
    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    /// Check if the session is marked for deletion
    pub fn is_deleted(&self) -> bool {
        self.record.is_deleted()
    }

    /// Read-only view of the working record
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// Names of the stored attributes (flash keys excluded)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.record.attributes.keys().map(String::as_str)
    }

    /// Get a raw value from the session.
    ///
    /// Attributes win over flash values. A flash value is removed as it is
    /// returned, so a second call yields `None`.
    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.record.attributes.get(key) {
            return Some(value.clone());
        }
        let value = self.record.metadata.flash.remove(key)?;
        self.dirty = true;
        Some(value)
    }

    /// Get a typed value from the session.
    ///
    /// Same read-once rules as [`Session::get_value`]; a flash value is
    /// consumed even when it does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Set a value in the session.
    ///
    /// A value that serializes to `null` (such as `None`) removes the key.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> SessionResult<()> {
        let value = serde_json::to_value(value)?;
        if value.is_null() {
            self.record.attributes.remove(key);
        } else {
            self.record.attributes.insert(key.to_string(), value);
        }
        self.dirty = true;
        Ok(())
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.record.attributes.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Store a value that will be returned by exactly one `get`
    pub fn flash<T: Serialize>(&mut self, key: &str, value: T) -> SessionResult<()> {
        let value = serde_json::to_value(value)?;
        self.record.metadata.flash.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    /// Check if a key exists as an attribute or a pending flash value.
    ///
    /// Does not consume flash values.
    pub fn has(&self, key: &str) -> bool {
        self.record.attributes.contains_key(key) || self.record.metadata.flash.contains_key(key)
    }

    /// Mark the session for deletion.
    ///
    /// The store is only touched by the engine once the handler returns.
    pub fn delete_session(&mut self) {
        self.record.metadata.delete = true;
        self.dirty = true;
    }

    /// Whether the engine has to write the record back to the store
    pub fn needs_persistence(&self) -> bool {
        self.needs_persistence_at(Utc::now())
    }

    pub(crate) fn needs_persistence_at(&self, now: DateTime<Utc>) -> bool {
        self.dirty || self.access_window_elapsed(now)
    }

    /// Refresh `accessed`, at most once per throttle window
    pub fn update_access_time(&mut self) {
        self.update_access_time_at(Utc::now());
    }

    pub(crate) fn update_access_time_at(&mut self, now: DateTime<Utc>) {
        if !self.access_window_elapsed(now) {
            return;
        }
        self.record.metadata.accessed = Some(now);
        self.last_access_update = Some(now);
        self.dirty = true;
    }

    fn access_window_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_access_update {
            Some(last) => now - last >= self.access_throttle,
            None => true,
        }
    }

    /// Swap in a new id after rotation
    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    /// Clear the dirty flag once the record has been written
    pub(crate) fn mark_persisted(&mut self) {
        self.dirty = false;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("record", &self.record)
            .field("is_new", &self.is_new)
            .field("dirty", &self.dirty)
            .finish()
    }
}
