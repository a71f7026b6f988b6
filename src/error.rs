//! Error types for backup and restore runs.
//!
//! Every variant names the key or file it failed on. None of them is
//! recoverable at this layer: a run either completes or stops with one of
//! these errors.

use std::path::PathBuf;

use crate::store::StoreError;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Backup and restore errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The store could not serve a query for a configured key.
    #[error("failed to get key '{key}': {source}")]
    Query {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The store rejected a write during restore, after all retries.
    #[error("failed to restore key '{key}': {source}")]
    Mutation {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error with the offending path.
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A restore worker panicked or was cancelled.
    #[error("restore worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// Create an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn query(key: impl Into<String>, source: StoreError) -> Self {
        Self::Query {
            key: key.into(),
            source,
        }
    }

    pub fn mutation(key: impl Into<String>, source: StoreError) -> Self {
        Self::Mutation {
            key: key.into(),
            source,
        }
    }

    /// The store key this error is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Query { key, .. } | Self::Mutation { key, .. } => Some(key),
            Self::Serialization(_) | Self::Io { .. } | Self::Config(_) | Self::Worker(_) => None,
        }
    }
}
