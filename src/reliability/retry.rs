//! Retry utilities for store mutations.
//!
//! Provides a bounded retry loop for transient failures using the `backon`
//! crate. Attempts are separated by a constant delay; there is no
//! exponential growth. Only errors for which [`StoreError::is_transient`]
//! holds are retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use etcd_backup::reliability::retry::{retry_store_call, RetryConfig};
//!
//! let result = retry_store_call(&RetryConfig::with_retries(5), "/app/key", || async {
//!     client.set("/app/key", "value", 0).await
//! })
//! .await;
//! ```

use backon::{ConstantBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants;
use crate::store::StoreError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Delay between two attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_retries(constants::DEFAULT_RETRIES)
    }
}

impl RetryConfig {
    /// Retry up to `max_retries` times with the default delay.
    #[must_use]
    pub const fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: Duration::from_millis(constants::DEFAULT_RETRY_DELAY_MS),
        }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::with_retries(0)
    }

    /// Set the delay between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Build the constant backoff strategy.
    fn build_backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_retries as usize)
    }
}

/// Run a store call, retrying transient failures.
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `key` - Key the call is about, for logging
/// * `operation` - The store call to retry
///
/// # Returns
///
/// The result of the operation, or the last error if all retries failed or
/// the error was permanent.
pub async fn retry_store_call<F, Fut, T>(
    config: &RetryConfig,
    key: &str,
    operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let backoff = config.build_backoff();
    let max_retries = config.max_retries;

    let mut attempt = 0u32;
    let notify = |err: &StoreError, dur: Duration| {
        attempt += 1;
        warn!(
            key = %key,
            attempt = attempt,
            max_retries = max_retries,
            next_delay_ms = dur.as_millis() as u64,
            error = %err,
            "Store call failed, will retry"
        );
    };

    let result = operation
        .retry(backoff)
        .when(StoreError::is_transient)
        .notify(notify)
        .await;

    if let Err(e) = &result {
        debug!(key = %key, error = %e, "Store call failed permanently");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig::with_retries(retries).with_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, constants::DEFAULT_RETRIES);
        assert_eq!(
            config.delay,
            Duration::from_millis(constants::DEFAULT_RETRY_DELAY_MS)
        );
    }

    #[test]
    fn test_retry_config_none() {
        assert_eq!(RetryConfig::none().max_retries, 0);
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_store_call(&fast(3), "/k", || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_store_call(&fast(3), "/k", || {
            let c = counter_clone.clone();
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(StoreError::Connection(format!("attempt {attempt} refused")))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), StoreError> = retry_store_call(&fast(2), "/k", || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Timeout("always slow".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
        // Initial attempt + 2 retries = 3 total
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), StoreError> = retry_store_call(&fast(5), "/k", || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::NotAFile {
                    key: "/k".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), StoreError> = retry_store_call(&RetryConfig::none(), "/k", || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Connection("refused".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
