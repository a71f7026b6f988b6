//! Reliability primitives for talking to a remote store.

pub mod retry;

pub use retry::{RetryConfig, retry_store_call};
