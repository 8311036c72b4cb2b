//! Persisted session record
//!
//! A record is what travels between the engine and a store. User data lives in
//! `attributes`; the bookkeeping the engine relies on lives in `metadata`, so a
//! user key can never shadow or remove a reserved field.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Reserved bookkeeping fields of a session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// One-shot values, removed the first time they are read
    #[serde(default)]
    pub flash: HashMap<String, Value>,

    /// Last time `accessed` was materialized
    #[serde(default)]
    pub accessed: Option<DateTime<Utc>>,

    /// Absolute expiration instant (None = never expires)
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,

    /// Marks the record for removal at the end of the request
    #[serde(default)]
    pub delete: bool,
}

/// The persisted unit of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub metadata: SessionMetadata,

    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl SessionRecord {
    /// A fresh record: no data, `accessed = now`, `expire = now + ttl` when a ttl is given
    pub fn new(now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            metadata: SessionMetadata {
                flash: HashMap::new(),
                accessed: Some(now),
                expire: ttl.map(|ttl| now + ttl),
                delete: false,
            },
            attributes: HashMap::new(),
        }
    }

    /// Whether the record may still be used at `now`.
    ///
    /// A record expiring exactly at `now` is already invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.metadata.expire {
            Some(expire) => now < expire,
            None => true,
        }
    }

    /// Sliding expiration: move `expire` to `now + ttl`.
    ///
    /// Returns false (and leaves the record alone) when no ttl is configured.
    pub fn restamp(&mut self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => {
                self.metadata.expire = Some(now + ttl);
                true
            }
            None => false,
        }
    }

    /// Whole seconds left until `expire`, rounded up, for stores that keep
    /// their own TTL.
    ///
    /// `None` when the record never expires. May be zero or negative for a
    /// record that is already past its expiration.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.metadata
            .expire
            .map(|expire| ((expire - now).num_milliseconds() + 999).div_euclid(1000))
    }

    /// Whether the record is marked for deletion
    pub fn is_deleted(&self) -> bool {
        self.metadata.delete
    }
}

/// Free-standing validity check, equivalent to [`SessionRecord::is_valid_at`]
pub fn session_valid(record: &SessionRecord, now: DateTime<Utc>) -> bool {
    record.is_valid_at(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validity_boundaries() {
        let now = Utc::now();
        let mut record = SessionRecord::new(now, None);
        assert!(session_valid(&record, now));

        record.metadata.expire = Some(now + Duration::seconds(1));
        assert!(session_valid(&record, now));

        record.metadata.expire = Some(now);
        assert!(!session_valid(&record, now));

        record.metadata.expire = Some(now - Duration::hours(1));
        assert!(!session_valid(&record, now));
    }

    #[test]
    fn test_new_record() {
        let now = Utc::now();
        let record = SessionRecord::new(now, Some(Duration::seconds(3600)));
        assert_eq!(record.metadata.accessed, Some(now));
        assert_eq!(record.metadata.expire, Some(now + Duration::seconds(3600)));
        assert!(record.metadata.flash.is_empty());
        assert!(!record.is_deleted());

        let record = SessionRecord::new(now, None);
        assert_eq!(record.metadata.expire, None);
    }

    #[test]
    fn test_restamp() {
        let created = Utc::now() - Duration::minutes(30);
        let mut record = SessionRecord::new(created, Some(Duration::seconds(3600)));
        let now = Utc::now();

        assert!(record.restamp(now, Some(Duration::seconds(3600))));
        assert_eq!(record.metadata.expire, Some(now + Duration::seconds(3600)));

        let before = record.clone();
        assert!(!record.restamp(now, None));
        assert_eq!(record, before);
    }

    #[test]
    fn test_remaining_secs() {
        let now = Utc::now();
        let record = SessionRecord::new(now, Some(Duration::seconds(90)));
        assert_eq!(record.remaining_secs(now), Some(90));
        assert_eq!(SessionRecord::new(now, None).remaining_secs(now), None);
    }

    #[test]
    fn test_remaining_secs_rounds_up() {
        let now = Utc::now();
        let mut record = SessionRecord::new(now, None);

        record.metadata.expire = Some(now + Duration::milliseconds(1500));
        assert_eq!(record.remaining_secs(now), Some(2));

        record.metadata.expire = Some(now + Duration::milliseconds(200));
        assert_eq!(record.remaining_secs(now), Some(1));

        record.metadata.expire = Some(now);
        assert_eq!(record.remaining_secs(now), Some(0));

        record.metadata.expire = Some(now - Duration::milliseconds(1500));
        assert!(record.remaining_secs(now).unwrap() <= 0);
    }

    #[test]
    fn test_user_keys_do_not_collide_with_metadata() {
        let mut record = SessionRecord::new(Utc::now(), None);
        record.attributes.insert("delete".into(), json!(true));
        record.attributes.insert("expire".into(), json!("soon"));

        let json = serde_json::to_string(&record).unwrap();
        let parsed: SessionRecord = serde_json::from_str(&json).unwrap();
        assert!(!parsed.is_deleted());
        assert_eq!(parsed.metadata.expire, None);
        assert_eq!(parsed.attributes.get("delete"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed: SessionRecord = serde_json::from_str(r#"{"metadata":{}}"#).unwrap();
        assert_eq!(parsed, SessionRecord::default());
    }
}
