//! In-memory hierarchical store.
//!
//! Mirrors the etcd v2 keyspace model on top of a `DashMap`: keys are
//! slash-separated paths, parent directories are created implicitly, and
//! entries may carry a TTL. Ideal for tests and for embedding.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::collections::HashMap;

use super::{MutationClient, Node, QueryClient, StoreError};

const ROOT: &str = "/";

/// Entry stored in the memory store with optional expiration.
#[derive(Debug, Clone)]
struct MemoryEntry {
    /// `None` for directories.
    value: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    fn new(value: Option<String>, ttl: u64) -> Self {
        let expires_at = (ttl > 0)
            .then(|| i64::try_from(ttl).ok())
            .flatten()
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Self { value, expires_at }
    }

    fn is_dir(&self) -> bool {
        self.value.is_none()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    fn to_node(&self, key: &str, now: DateTime<Utc>) -> Node {
        Node {
            key: key.to_string(),
            value: self.value.clone(),
            dir: self.is_dir(),
            expiration: self.expires_at,
            ttl: self
                .expires_at
                .map(|exp| exp.signed_duration_since(now).num_seconds()),
            nodes: Vec::new(),
        }
    }
}

/// In-memory hierarchical key-value store using DashMap.
///
/// `MemoryStore` is safe for concurrent use from many tasks. The root
/// directory `/` always exists and is not stored explicitly. Expired
/// entries are ignored on read and replaced on write.
///
/// # Example
///
/// ```ignore
/// use etcd_backup::store::{MemoryStore, MutationClient};
///
/// let store = MemoryStore::new();
/// store.set("/app/name", "demo", 0).await?;
/// assert!(store.is_dir("/app"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, directories included (root excluded).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of a live leaf, `None` for directories and missing keys.
    pub fn get_value(&self, key: &str) -> Option<String> {
        let key = normalize(key);
        let entry = self.data.get(&key)?;
        if entry.is_expired(Utc::now()) {
            return None;
        }
        entry.value.clone()
    }

    /// Whether `key` is a live directory.
    pub fn is_dir(&self, key: &str) -> bool {
        let key = normalize(key);
        if key == ROOT {
            return true;
        }
        self.data
            .get(&key)
            .is_some_and(|entry| entry.is_dir() && !entry.is_expired(Utc::now()))
    }

    /// Expiration of a live entry.
    pub fn expiration(&self, key: &str) -> Option<DateTime<Utc>> {
        self.data.get(&normalize(key))?.expires_at
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Utc::now();
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Removes all entries from the store.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Create every missing ancestor of `key` as a directory.
    fn ensure_parents(&self, key: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        for ancestor in ancestors(key) {
            match self.data.entry(ancestor.clone()) {
                MapEntry::Occupied(mut occupied) => {
                    if occupied.get().is_expired(now) {
                        occupied.insert(MemoryEntry::new(None, 0));
                    } else if !occupied.get().is_dir() {
                        return Err(StoreError::NotADirectory { key: ancestor });
                    }
                },
                MapEntry::Vacant(vacant) => {
                    vacant.insert(MemoryEntry::new(None, 0));
                },
            }
        }
        Ok(())
    }

    fn build_node(
        key: &str,
        entry: &MemoryEntry,
        children: &HashMap<String, Vec<(String, MemoryEntry)>>,
        sorted: bool,
        recursive: bool,
        depth: usize,
        now: DateTime<Utc>,
    ) -> Node {
        let mut node = entry.to_node(key, now);
        if !entry.is_dir() || (!recursive && depth > 0) {
            return node;
        }

        if let Some(list) = children.get(key) {
            let mut list: Vec<&(String, MemoryEntry)> = list.iter().collect();
            if sorted {
                list.sort_by(|a, b| a.0.cmp(&b.0));
            }
            node.nodes = list
                .into_iter()
                .map(|(child_key, child)| {
                    Self::build_node(child_key, child, children, sorted, recursive, depth + 1, now)
                })
                .collect();
        }
        node
    }
}

#[async_trait]
impl QueryClient for MemoryStore {
    async fn get(&self, key: &str, sorted: bool, recursive: bool) -> Result<Node, StoreError> {
        let key = normalize(key);
        let now = Utc::now();

        let mut children: HashMap<String, Vec<(String, MemoryEntry)>> = HashMap::new();
        for item in &self.data {
            if item.value().is_expired(now) {
                continue;
            }
            children
                .entry(parent(item.key()).to_string())
                .or_default()
                .push((item.key().clone(), item.value().clone()));
        }

        if key == ROOT {
            let root = MemoryEntry::new(None, 0);
            let mut node = Self::build_node(ROOT, &root, &children, sorted, recursive, 0, now);
            // etcd reports the root without a key.
            node.key = String::new();
            return Ok(node);
        }

        let entry = self
            .data
            .get(&key)
            .map(|entry| entry.value().clone())
            .filter(|entry| !entry.is_expired(now))
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })?;

        Ok(Self::build_node(&key, &entry, &children, sorted, recursive, 0, now))
    }
}

#[async_trait]
impl MutationClient for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), StoreError> {
        let key = normalize(key);
        if key == ROOT {
            return Err(StoreError::NotAFile { key });
        }
        self.ensure_parents(&key)?;

        let now = Utc::now();
        match self.data.entry(key.clone()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_dir() && !occupied.get().is_expired(now) {
                    return Err(StoreError::NotAFile { key });
                }
                occupied.insert(MemoryEntry::new(Some(value.to_string()), ttl));
            },
            MapEntry::Vacant(vacant) => {
                vacant.insert(MemoryEntry::new(Some(value.to_string()), ttl));
            },
        }
        Ok(())
    }

    async fn set_dir(&self, key: &str, ttl: u64) -> Result<(), StoreError> {
        let key = normalize(key);
        if key == ROOT {
            return Err(StoreError::NotAFile { key });
        }
        self.ensure_parents(&key)?;

        let now = Utc::now();
        match self.data.entry(key.clone()) {
            MapEntry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return Err(StoreError::NotAFile { key });
                }
                occupied.insert(MemoryEntry::new(None, ttl));
            },
            MapEntry::Vacant(vacant) => {
                vacant.insert(MemoryEntry::new(None, ttl));
            },
        }
        Ok(())
    }
}

/// Canonical form of a key: leading slash, no trailing slash.
fn normalize(key: &str) -> String {
    let trimmed = key.trim_matches('/');
    if trimmed.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn parent(key: &str) -> &str {
    match key.rsplit_once('/') {
        Some(("", _)) | None => ROOT,
        Some((head, _)) => head,
    }
}

/// Ancestors of `key` from the top down, root excluded.
fn ancestors(key: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = parent(key);
    while current != ROOT {
        result.push(current.to_string());
        current = parent(current);
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("/a/b"), "/a/b");
    }

    #[test]
    fn test_parent_and_ancestors() {
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/a/b/c"), "/a/b");
        assert_eq!(ancestors("/a/b/c"), vec!["/a", "/a/b"]);
        assert!(ancestors("/a").is_empty());
    }

    #[tokio::test]
    async fn test_set_creates_parents() {
        let store = MemoryStore::new();
        store.set("/a/b/c", "value", 0).await.unwrap();

        assert!(store.is_dir("/a"));
        assert!(store.is_dir("/a/b"));
        assert_eq!(store.get_value("/a/b/c"), Some("value".to_string()));
        assert_eq!(store.keys(), vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[tokio::test]
    async fn test_get_root_recursive_sorted() {
        let store = MemoryStore::new();
        store.set("/b", "2", 0).await.unwrap();
        store.set("/a/x", "1", 0).await.unwrap();
        store.set_dir("/c", 0).await.unwrap();

        let root = store.get("/", true, true).await.unwrap();
        assert_eq!(root.key, "");
        assert!(root.dir);

        let keys: Vec<&str> = root.nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["/a", "/b", "/c"]);
        assert_eq!(root.nodes[0].nodes, vec![Node::leaf("/a/x", "1")]);
        assert!(root.nodes[2].dir);
        assert!(root.nodes[2].nodes.is_empty());
    }

    #[tokio::test]
    async fn test_get_non_recursive_lists_direct_children_only() {
        let store = MemoryStore::new();
        store.set("/a/b/c", "v", 0).await.unwrap();

        let node = store.get("/a", true, false).await.unwrap();
        assert_eq!(node.key, "/a");
        assert_eq!(node.nodes.len(), 1);
        assert_eq!(node.nodes[0].key, "/a/b");
        assert!(node.nodes[0].nodes.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        let err = store.get("/missing", false, false).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { key } if key == "/missing"));
    }

    #[tokio::test]
    async fn test_set_over_directory_fails() {
        let store = MemoryStore::new();
        store.set_dir("/dir", 0).await.unwrap();
        let err = store.set("/dir", "v", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn test_set_under_leaf_fails() {
        let store = MemoryStore::new();
        store.set("/leaf", "v", 0).await.unwrap();
        let err = store.set("/leaf/child", "v", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory { key } if key == "/leaf"));
    }

    #[tokio::test]
    async fn test_ttl_sets_expiration() {
        let store = MemoryStore::new();
        store.set("/tmp", "v", 60).await.unwrap();

        let node = store.get("/tmp", false, false).await.unwrap();
        assert!(node.expiration.is_some());
        let ttl = node.ttl.unwrap();
        assert!((59..=60).contains(&ttl));
        assert!(store.expiration("/ttl-less").is_none());
    }

    #[tokio::test]
    async fn test_overwrite_leaf() {
        let store = MemoryStore::new();
        store.set("/key", "v1", 0).await.unwrap();
        store.set("/key", "v2", 0).await.unwrap();
        assert_eq!(store.get_value("/key"), Some("v2".to_string()));
        assert_eq!(store.len(), 1);
    }
}
