//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use etcd_backup::store::{MemoryStore, MutationClient, Node, QueryClient, StoreError};

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A store holding a small application tree:
///
/// ```text
/// /app/name = demo
/// /app/db/host = db.local
/// /app/db/port = 5432
/// /empty/            (directory)
/// /flags/beta = on
/// ```
pub async fn sample_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set("/app/name", "demo", 0).await.unwrap();
    store.set("/app/db/host", "db.local", 0).await.unwrap();
    store.set("/app/db/port", "5432", 0).await.unwrap();
    store.set_dir("/empty", 0).await.unwrap();
    store.set("/flags/beta", "on", 0).await.unwrap();
    store
}

/// Wraps a [`MemoryStore`], delays every write and tracks how many writes
/// overlap.
#[derive(Default)]
pub struct InstrumentedClient {
    pub store: MemoryStore,
    pub delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    order: Mutex<Vec<String>>,
}

impl InstrumentedClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys in the order their writes started.
    pub fn started(&self) -> Vec<String> {
        self.order.lock().clone()
    }

    async fn track<F>(&self, key: &str, write: F) -> Result<(), StoreError>
    where
        F: std::future::Future<Output = Result<(), StoreError>>,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.order.lock().push(key.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = write.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl MutationClient for InstrumentedClient {
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), StoreError> {
        self.track(key, self.store.set(key, value, ttl)).await
    }

    async fn set_dir(&self, key: &str, ttl: u64) -> Result<(), StoreError> {
        self.track(key, self.store.set_dir(key, ttl)).await
    }
}

/// Fails writes to selected keys, either a fixed number of times with a
/// transient error or forever with a permanent one.
#[derive(Default)]
pub struct FaultyClient {
    pub store: MemoryStore,
    transient: Mutex<HashMap<String, usize>>,
    permanent: Vec<String>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl FaultyClient {
    /// Fail every write to `keys` with a permanent error.
    pub fn failing(keys: &[&str]) -> Self {
        Self {
            permanent: keys.iter().map(|k| (*k).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Fail the first `times` writes to `key` with a connection error.
    pub fn flaky(key: &str, times: usize) -> Self {
        let client = Self::default();
        client.transient.lock().insert(key.to_string(), times);
        client
    }

    /// Number of write attempts made for `key`.
    pub fn attempts(&self, key: &str) -> usize {
        self.attempts.lock().get(key).copied().unwrap_or(0)
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        *self.attempts.lock().entry(key.to_string()).or_default() += 1;

        if self.permanent.iter().any(|k| k == key) {
            return Err(StoreError::Status {
                status: 403,
                error_code: 110,
                message: format!("permission denied on {key}"),
            });
        }

        let mut transient = self.transient.lock();
        if let Some(remaining) = transient.get_mut(key)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(StoreError::Connection("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MutationClient for FaultyClient {
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), StoreError> {
        self.check(key)?;
        self.store.set(key, value, ttl).await
    }

    async fn set_dir(&self, key: &str, ttl: u64) -> Result<(), StoreError> {
        self.check(key)?;
        self.store.set_dir(key, ttl).await
    }
}

/// Answers queries from a fixed map of nodes and records every call.
#[derive(Default)]
pub struct ScriptedQueryClient {
    nodes: HashMap<String, Node>,
    calls: Mutex<Vec<(String, bool, bool)>>,
}

impl ScriptedQueryClient {
    pub fn new(nodes: impl IntoIterator<Item = (&'static str, Node)>) -> Self {
        Self {
            nodes: nodes
                .into_iter()
                .map(|(key, node)| (key.to_string(), node))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(key, sorted, recursive)` of every query, in call order.
    pub fn calls(&self) -> Vec<(String, bool, bool)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl QueryClient for ScriptedQueryClient {
    async fn get(&self, key: &str, sorted: bool, recursive: bool) -> Result<Node, StoreError> {
        self.calls.lock().push((key.to_string(), sorted, recursive));
        self.nodes
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}
