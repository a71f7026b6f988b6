//! Client traits for the key-value store.
//!
//! Defines the read and write interfaces the extractor and the restore
//! scheduler depend on, so any store speaking etcd's hierarchical model
//! can be plugged in.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Node, StoreError};

/// Read access to a hierarchical store.
///
/// Implementations must be thread-safe (`Send + Sync`) for use with tokio.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Fetch the node stored at `key`.
    ///
    /// With `recursive` set, the returned node carries its whole subtree;
    /// otherwise only the direct children of a directory are listed. With
    /// `sorted` set, children are returned ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the store cannot be
    /// reached.
    async fn get(&self, key: &str, sorted: bool, recursive: bool) -> Result<Node, StoreError>;
}

/// Write access to a hierarchical store.
///
/// Implementations are called from many restore workers at once and must be
/// safe for concurrent, independent calls.
#[async_trait]
pub trait MutationClient: Send + Sync {
    /// Store `value` at `key`. A `ttl` of `0` means the key never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write or cannot be reached.
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), StoreError>;

    /// Create a directory at `key`. A `ttl` of `0` means it never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write or cannot be reached.
    async fn set_dir(&self, key: &str, ttl: u64) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: QueryClient + ?Sized> QueryClient for Arc<T> {
    async fn get(&self, key: &str, sorted: bool, recursive: bool) -> Result<Node, StoreError> {
        (**self).get(key, sorted, recursive).await
    }
}

#[async_trait]
impl<T: MutationClient + ?Sized> MutationClient for Arc<T> {
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), StoreError> {
        (**self).set(key, value, ttl).await
    }

    async fn set_dir(&self, key: &str, ttl: u64) -> Result<(), StoreError> {
        (**self).set_dir(key, ttl).await
    }
}
