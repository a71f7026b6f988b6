//! Replay a snapshot against a live store with bounded concurrency.
//!
//! Every record gets its own tokio task, spawned in snapshot order. A task
//! holds a semaphore permit only while it writes its record, so at most
//! `concurrent_requests` writes are in flight at any time. Completion order
//! is unconstrained.
//!
//! The first failed write (after retries) stops the run: tasks that have not
//! started writing yet skip their record, tasks already writing finish, and
//! the error is returned once every task has been joined. Nothing is rolled
//! back.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::constants;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::record::{Record, RecordKind};
use crate::reliability::{RetryConfig, retry_store_call};
use crate::store::MutationClient;

/// Counter names, as reported to users.
pub const DATA_SET_SIZE: &str = "DataSetSize";
pub const EMPTY_DIRECTORIES: &str = "EmptyDirectories";
pub const KEYS_INSERTED: &str = "KeysInserted";
pub const EXPIRED_KEYS: &str = "ExpiredKeys";

/// Counters shared by all restore workers.
///
/// `DataSetSize` is set at construction and again when a restore starts. A restored directory counts both
/// as an empty directory and as an inserted key. Records that expired before
/// they could be written are counted apart and not written.
#[derive(Debug, Default)]
pub struct RestoreStatistics {
    data_set_size: AtomicU64,
    empty_directories: AtomicU64,
    keys_inserted: AtomicU64,
    expired_keys: AtomicU64,
}

/// Point-in-time copy of [`RestoreStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatisticsSnapshot {
    pub data_set_size: u64,
    pub empty_directories: u64,
    pub keys_inserted: u64,
    pub expired_keys: u64,
}

impl RestoreStatistics {
    /// Statistics for a restore of `records`.
    pub fn new(records: &[Record]) -> Self {
        Self {
            data_set_size: AtomicU64::new(records.len() as u64),
            ..Self::default()
        }
    }

    pub fn data_set_size(&self) -> u64 {
        self.data_set_size.load(Ordering::SeqCst)
    }

    pub fn empty_directories(&self) -> u64 {
        self.empty_directories.load(Ordering::SeqCst)
    }

    pub fn keys_inserted(&self) -> u64 {
        self.keys_inserted.load(Ordering::SeqCst)
    }

    pub fn expired_keys(&self) -> u64 {
        self.expired_keys.load(Ordering::SeqCst)
    }

    /// Look a counter up by name.
    pub fn get(&self, name: &str) -> Option<u64> {
        match name {
            DATA_SET_SIZE => Some(self.data_set_size()),
            EMPTY_DIRECTORIES => Some(self.empty_directories()),
            KEYS_INSERTED => Some(self.keys_inserted()),
            EXPIRED_KEYS => Some(self.expired_keys()),
            _ => None,
        }
    }

    /// All counters with their names, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> {
        self.snapshot().iter()
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            data_set_size: self.data_set_size(),
            empty_directories: self.empty_directories(),
            keys_inserted: self.keys_inserted(),
            expired_keys: self.expired_keys(),
        }
    }

    /// Start a run over `total` records, clearing counts of earlier runs.
    fn begin(&self, total: usize) {
        self.data_set_size.store(total as u64, Ordering::SeqCst);
        self.empty_directories.store(0, Ordering::SeqCst);
        self.keys_inserted.store(0, Ordering::SeqCst);
        self.expired_keys.store(0, Ordering::SeqCst);
    }

    fn directory_restored(&self) {
        self.empty_directories.fetch_add(1, Ordering::SeqCst);
        self.keys_inserted.fetch_add(1, Ordering::SeqCst);
    }

    fn key_restored(&self) {
        self.keys_inserted.fetch_add(1, Ordering::SeqCst);
    }

    fn key_expired(&self) {
        self.expired_keys.fetch_add(1, Ordering::SeqCst);
    }
}

impl StatisticsSnapshot {
    /// All counters with their names, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + use<> {
        [
            (DATA_SET_SIZE, self.data_set_size),
            (EMPTY_DIRECTORIES, self.empty_directories),
            (KEYS_INSERTED, self.keys_inserted),
            (EXPIRED_KEYS, self.expired_keys),
        ]
        .into_iter()
    }
}

/// Tuning for a restore run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Maximum number of writes in flight. Values below 1 are raised to 1.
    pub concurrent_requests: usize,
    /// Retry policy applied to each write.
    pub retry: RetryConfig,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            concurrent_requests: constants::DEFAULT_CONCURRENT_REQUESTS,
            retry: RetryConfig::default(),
        }
    }
}

/// Write every record of `records` to `client`.
///
/// `statistics` is reset to this data set, updated as records complete and
/// keeps its partial values when the run fails. Returns the final counters
/// on success.
///
/// # Errors
///
/// Returns [`Error::Mutation`] for the first record that could not be
/// written, or [`Error::Worker`] if a worker task panicked.
pub async fn restore_data_set<C>(
    records: Vec<Record>,
    options: &RestoreOptions,
    client: Arc<C>,
    statistics: Arc<RestoreStatistics>,
    progress: Arc<dyn Progress>,
) -> Result<StatisticsSnapshot>
where
    C: MutationClient + ?Sized + 'static,
{
    statistics.begin(records.len());
    let limit = options.concurrent_requests.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let stopped = Arc::new(AtomicBool::new(false));

    info!(
        records = records.len(),
        concurrent_requests = limit,
        max_retries = options.retry.max_retries,
        "Starting restore"
    );
    progress.restore_started(records.len());

    let mut workers = JoinSet::new();
    for record in records {
        let semaphore = Arc::clone(&semaphore);
        let stopped = Arc::clone(&stopped);
        let client = Arc::clone(&client);
        let statistics = Arc::clone(&statistics);
        let progress = Arc::clone(&progress);
        let retry = options.retry.clone();

        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::Worker(e.to_string()))?;

            if stopped.load(Ordering::SeqCst) {
                debug!(key = %record.key, "Restore stopped, skipping key");
                return Ok(());
            }

            match restore_key(&record, client.as_ref(), &statistics, &retry).await {
                Ok(()) => {
                    progress.restored(&record.key);
                    Ok(())
                },
                Err(e) => {
                    stopped.store(true, Ordering::SeqCst);
                    Err(e)
                },
            }
        });
    }

    let mut first_error: Option<Error> = None;
    while let Some(joined) = workers.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(Error::Worker(e.to_string())));
        if let Err(e) = outcome {
            stopped.store(true, Ordering::SeqCst);
            error!(key = e.key().unwrap_or_default(), error = %e, "Restore failed");
            first_error.get_or_insert(e);
        }
    }
    progress.finished();

    if let Some(e) = first_error {
        return Err(e);
    }

    let snapshot = statistics.snapshot();
    info!(
        data_set_size = snapshot.data_set_size,
        empty_directories = snapshot.empty_directories,
        keys_inserted = snapshot.keys_inserted,
        expired_keys = snapshot.expired_keys,
        "Restore complete"
    );
    Ok(snapshot)
}

/// Write a single record and update the counters.
///
/// The TTL sent to the store is the record's remaining lifetime at the time
/// of the call. Already expired records are not written.
///
/// # Errors
///
/// Returns [`Error::Mutation`] if the write failed after retries.
pub async fn restore_key<C>(
    record: &Record,
    client: &C,
    statistics: &RestoreStatistics,
    retry: &RetryConfig,
) -> Result<()>
where
    C: MutationClient + ?Sized,
{
    let now = Utc::now();
    if record.is_expired_at(now) {
        debug!(key = %record.key, "Key expired before restore, skipping");
        statistics.key_expired();
        return Ok(());
    }

    let ttl = record.ttl_at(now);
    match &record.kind {
        RecordKind::Directory => {
            set_directory(&record.key, ttl, client, retry).await?;
            statistics.directory_restored();
        },
        RecordKind::Leaf(value) => {
            set_key(&record.key, value, ttl, client, retry).await?;
            statistics.key_restored();
        },
    }
    Ok(())
}

async fn set_key<C>(key: &str, value: &str, ttl: u64, client: &C, retry: &RetryConfig) -> Result<()>
where
    C: MutationClient + ?Sized,
{
    retry_store_call(retry, key, || client.set(key, value, ttl))
        .await
        .map_err(|e| Error::mutation(key, e))
}

async fn set_directory<C>(key: &str, ttl: u64, client: &C, retry: &RetryConfig) -> Result<()>
where
    C: MutationClient + ?Sized,
{
    retry_store_call(retry, key, || client.set_dir(key, ttl))
        .await
        .map_err(|e| Error::mutation(key, e))
}
