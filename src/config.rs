//! Backup configuration.
//!
//! A run is configured from three layers, highest priority first:
//!
//! - command-line flags ([`Overrides`])
//! - the backup configuration file ([`ConfigFile`], JSON or TOML)
//! - built-in defaults from [`crate::constants`]
//!
//! The merged result is a [`Config`], validated before use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::reliability::RetryConfig;
use crate::restore::RestoreOptions;
use crate::strategy::BackupStrategy;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Contents of a backup configuration file. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, alias = "ConcurrentRequests")]
    pub concurrent_requests: Option<usize>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub etcd_config_path: Option<PathBuf>,
    #[serde(default)]
    pub dump_file_path: Option<PathBuf>,
    #[serde(default)]
    pub backup_strategy: Option<BackupStrategy>,
}

impl ConfigFile {
    /// Load a configuration file. Files ending in `.toml` are read as TOML,
    /// anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let file = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        };
        Ok(file)
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub concurrent_requests: Option<usize>,
    pub retries: Option<u32>,
    pub etcd_config_path: Option<PathBuf>,
    pub dump_file_path: Option<PathBuf>,
    /// Replaces the strategy's key list when set.
    pub keys: Option<Vec<String>>,
    pub recursive: Option<bool>,
    pub sorted: Option<bool>,
}

/// Fully resolved configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub concurrent_requests: usize,
    pub retries: u32,
    pub etcd_config_path: PathBuf,
    pub dump_file_path: PathBuf,
    pub backup_strategy: BackupStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrent_requests: constants::DEFAULT_CONCURRENT_REQUESTS,
            retries: constants::DEFAULT_RETRIES,
            etcd_config_path: PathBuf::from(constants::DEFAULT_ETCD_CONFIG_PATH),
            dump_file_path: PathBuf::from(constants::DEFAULT_DUMP_FILE_PATH),
            backup_strategy: BackupStrategy::default(),
        }
    }
}

impl Config {
    /// Load the configuration file and apply `overrides` on top.
    ///
    /// With `path` set, the file must exist. Without it the default
    /// location is tried and built-in defaults are used when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::load_from(path)?,
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    ConfigFile::load_from(default_path)?
                } else {
                    debug!(
                        path = constants::DEFAULT_CONFIG_PATH,
                        "No configuration file, using defaults"
                    );
                    ConfigFile::default()
                }
            },
        };

        Ok(Self::from_file(file).with_overrides(overrides))
    }

    /// Fill the gaps of a configuration file with defaults.
    pub fn from_file(file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            concurrent_requests: file
                .concurrent_requests
                .unwrap_or(defaults.concurrent_requests),
            retries: file.retries.unwrap_or(defaults.retries),
            etcd_config_path: file.etcd_config_path.unwrap_or(defaults.etcd_config_path),
            dump_file_path: file.dump_file_path.unwrap_or(defaults.dump_file_path),
            backup_strategy: file.backup_strategy.unwrap_or(defaults.backup_strategy),
        }
    }

    /// Apply command-line values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(n) = overrides.concurrent_requests {
            self.concurrent_requests = n;
        }
        if let Some(n) = overrides.retries {
            self.retries = n;
        }
        if let Some(path) = &overrides.etcd_config_path {
            self.etcd_config_path.clone_from(path);
        }
        if let Some(path) = &overrides.dump_file_path {
            self.dump_file_path.clone_from(path);
        }
        if let Some(keys) = &overrides.keys {
            self.backup_strategy.keys.clone_from(keys);
        }
        if let Some(recursive) = overrides.recursive {
            self.backup_strategy.recursive = recursive;
        }
        if let Some(sorted) = overrides.sorted {
            self.backup_strategy.sorted = sorted;
        }
        self
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_retries(self.retries)
    }

    pub fn restore_options(&self) -> RestoreOptions {
        RestoreOptions {
            concurrent_requests: self.concurrent_requests,
            retry: self.retry_config(),
        }
    }

    /// Validate the resolved configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every problem if:
    /// - `concurrentRequests` is 0
    /// - `dumpFilePath` or `etcdConfigPath` is empty
    /// - a strategy key is empty
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.concurrent_requests == 0 {
            errors.push(
                "concurrentRequests cannot be 0\n  \
                 Set a positive number (default: 10)"
                    .to_string(),
            );
        } else if self.concurrent_requests > constants::MAX_RECOMMENDED_CONCURRENT_REQUESTS {
            warnings.push(format!(
                "concurrentRequests {} is above {}\n  \
                 Recommendation: large values can overload the cluster during restore",
                self.concurrent_requests,
                constants::MAX_RECOMMENDED_CONCURRENT_REQUESTS
            ));
        }

        if self.dump_file_path.as_os_str().is_empty() {
            errors.push("dumpFilePath cannot be empty".to_string());
        }
        if self.etcd_config_path.as_os_str().is_empty() {
            errors.push("etcdConfigPath cannot be empty".to_string());
        }

        if self.backup_strategy.keys.is_empty() {
            warnings.push("backupStrategy.keys is empty, a dump will contain no keys".to_string());
        }
        for key in &self.backup_strategy.keys {
            if key.is_empty() {
                errors.push("backupStrategy key cannot be empty".to_string());
            } else if !key.starts_with('/') {
                warnings.push(format!(
                    "backupStrategy key '{key}' does not start with '/'"
                ));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
