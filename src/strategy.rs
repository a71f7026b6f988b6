//! Backup strategy: which keys a dump covers and how they are queried.

use serde::{Deserialize, Serialize};

/// Keys to include in a backup.
///
/// `keys` are queried in order. With `recursive` set, each key stands for its
/// whole subtree; otherwise only the node itself is captured. `sorted` is
/// forwarded to the store and only affects the order of returned children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupStrategy {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub sorted: bool,
    #[serde(default)]
    pub recursive: bool,
}

impl Default for BackupStrategy {
    /// The whole keyspace, sorted, recursively.
    fn default() -> Self {
        Self {
            keys: vec!["/".to_string()],
            sorted: true,
            recursive: true,
        }
    }
}

impl BackupStrategy {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            sorted: false,
            recursive: false,
        }
    }

    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub const fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Whether `key` is covered by this strategy.
    ///
    /// Recursive strategies match any key that starts with one of the
    /// configured keys; non-recursive strategies require an exact match.
    pub fn matches(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| {
            key == candidate.as_str() || (self.recursive && key.starts_with(candidate.as_str()))
        })
    }
}
