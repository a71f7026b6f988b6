//! Flattened store entries captured by a backup.
//!
//! A [`Record`] is either a leaf holding a value or an (empty) directory.
//! The distinction is carried by [`RecordKind`], so a directory with a value
//! cannot be constructed. The time-to-live of a record is never stored: it is
//! recomputed from the absolute expiration every time it is needed.
//!
//! On disk a record is a sparse JSON object:
//!
//! ```json
//! { "key": "/app/name", "value": "demo", "expiration": "2030-01-01T00:00:00Z", "ttl": 120 }
//! ```
//!
//! `value` is present only for leaves. `ttl` is written as a hint for human
//! readers and ignored when the document is read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a record is a directory or a leaf with data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Container node without a value of its own.
    Directory,
    /// Node holding a value.
    Leaf(String),
}

/// A single store entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRecord", into = "RawRecord")]
pub struct Record {
    pub key: String,
    pub kind: RecordKind,
    pub expiration: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a leaf record without expiration.
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: RecordKind::Leaf(value.into()),
            expiration: None,
        }
    }

    /// Create a directory record without expiration.
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: RecordKind::Directory,
            expiration: None,
        }
    }

    /// Attach an absolute expiration time.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, RecordKind::Directory)
    }

    /// The stored value, `None` for directories.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Leaf(value) => Some(value),
            RecordKind::Directory => None,
        }
    }

    /// Seconds left before the record expires, relative to now.
    ///
    /// Returns `None` when the record never expires. The result is only
    /// meaningful at the moment it is computed.
    pub fn remaining_ttl(&self) -> Option<i64> {
        self.remaining_ttl_at(Utc::now())
    }

    /// Seconds left before the record expires, relative to `now`.
    pub fn remaining_ttl_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiration
            .map(|expiration| expiration.signed_duration_since(now).num_seconds())
    }

    /// True when the record has an expiration and it is already reached.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_ttl_at(now).is_some_and(|ttl| ttl <= 0)
    }

    /// TTL to hand to the store on restore, `0` meaning "never expires".
    ///
    /// Expired records map to `0` as well; callers are expected to check
    /// [`Record::is_expired_at`] first.
    pub fn ttl_at(&self, now: DateTime<Utc>) -> u64 {
        self.remaining_ttl_at(now)
            .and_then(|ttl| u64::try_from(ttl).ok())
            .unwrap_or(0)
    }
}

/// Wire representation of a [`Record`].
#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Self {
            key: raw.key,
            kind: match raw.value {
                Some(value) => RecordKind::Leaf(value),
                None => RecordKind::Directory,
            },
            expiration: raw.expiration,
        }
    }
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        let ttl = record.remaining_ttl().filter(|ttl| *ttl > 0);
        Self {
            key: record.key,
            value: match record.kind {
                RecordKind::Leaf(value) => Some(value),
                RecordKind::Directory => None,
            },
            expiration: record.expiration,
            ttl,
        }
    }
}
