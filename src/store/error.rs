//! Errors reported by store clients.

/// Failure of a single store call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No endpoint could be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Key does not exist (etcd error code 100).
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A value was expected but the key is a directory (etcd error code 102).
    #[error("not a file: {key}")]
    NotAFile { key: String },

    /// A directory was expected but the key holds a value (etcd error code 104).
    #[error("not a directory: {key}")]
    NotADirectory { key: String },

    /// The store answered with an unexpected HTTP status.
    #[error("HTTP status {status}: {message} (error code {error_code})")]
    Status {
        status: u16,
        error_code: u32,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    ///
    /// Connection failures, timeouts and HTTP 408/429/5xx are transient.
    /// Keyspace errors (missing key, wrong node type) are permanent.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::NotFound { .. }
            | Self::NotAFile { .. }
            | Self::NotADirectory { .. }
            | Self::Decode(_) => false,
        }
    }
}

/// Check if an HTTP status code is retryable.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}
