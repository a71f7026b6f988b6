//! Default values shared by the CLI and the configuration loader.

/// Default location of the backup configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "backup-configuration.json";

/// Default location of the etcd client configuration file.
pub const DEFAULT_ETCD_CONFIG_PATH: &str = "etcd-configuration.json";

/// Default location of the snapshot document.
pub const DEFAULT_DUMP_FILE_PATH: &str = "etcd-dump.json";

/// Maximum number of store mutations in flight during a restore.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 10;

/// Retries per mutation before a restore gives up.
pub const DEFAULT_RETRIES: u32 = 5;

/// Fixed delay between two attempts of the same mutation.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;

/// Concurrency above this value is accepted but reported as a warning.
pub const MAX_RECOMMENDED_CONCURRENT_REQUESTS: usize = 1000;

/// Endpoint used when the etcd configuration lists no machines.
pub const DEFAULT_ETCD_ENDPOINT: &str = "http://127.0.0.1:2379";

/// Per-request timeout for the etcd HTTP client.
pub const DEFAULT_ETCD_TIMEOUT_SECS: u64 = 10;
