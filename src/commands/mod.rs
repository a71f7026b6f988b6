//! CLI command implementations for etcd-backup.
//!
//! Each submodule implements one subcommand:
//!
//! - [`dump`] - Extract the configured keys into a snapshot file
//! - [`restore`] - Replay a snapshot file into the cluster
//! - [`config_cmd`] - Print the resolved configuration

pub mod config_cmd;
pub mod dump;
pub mod restore;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::constants;
use crate::store::{EtcdClient, EtcdConfig};

/// Load the etcd client configuration.
///
/// A missing file at the default location falls back to the local
/// endpoint; any other missing file is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_etcd_config(path: &Path) -> Result<EtcdConfig> {
    if !path.exists() && path == Path::new(constants::DEFAULT_ETCD_CONFIG_PATH) {
        info!(
            endpoint = constants::DEFAULT_ETCD_ENDPOINT,
            "No etcd configuration file, using default endpoint"
        );
        return Ok(EtcdConfig::default());
    }

    EtcdConfig::load_from(path)
        .with_context(|| format!("Failed to load etcd configuration: {}", path.display()))
}

/// Build an etcd client from the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn connect(path: &Path) -> Result<EtcdClient> {
    let etcd_config = load_etcd_config(path)?;
    let client = EtcdClient::new(&etcd_config).context("Failed to create etcd client")?;
    info!(
        endpoints = ?client.endpoints().iter().map(url::Url::as_str).collect::<Vec<_>>(),
        "Connected to etcd"
    );
    Ok(client)
}
