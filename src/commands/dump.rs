//! `dump`: extract the configured keys into a snapshot file.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use crate::backup::download_data_set;
use crate::config::Config;
use crate::progress::Progress;
use crate::snapshot::dump_data_set;
use crate::store::QueryClient;
use crate::utils::{file_size, format_bytes, format_elapsed};

/// Outcome of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub records: usize,
    pub path: PathBuf,
    pub bytes: Option<u64>,
}

/// Dump from the cluster named in the configuration.
///
/// # Errors
///
/// Returns an error if the cluster cannot be queried or the snapshot cannot
/// be written.
pub async fn execute(config: &Config, progress: &dyn Progress) -> Result<()> {
    let client = super::connect(&config.etcd_config_path)?;
    let started = Utc::now();

    let summary = run(config, &client, progress).await?;

    println!(
        "Dumped {} keys to {} ({}) in {}",
        summary.records,
        summary.path.display(),
        summary.bytes.map_or_else(|| "unknown size".to_string(), format_bytes),
        format_elapsed(Utc::now() - started)
    );
    Ok(())
}

/// Dump from any [`QueryClient`].
///
/// # Errors
///
/// Returns an error if a query fails or the snapshot cannot be written.
pub async fn run<C>(config: &Config, client: &C, progress: &dyn Progress) -> Result<DumpSummary>
where
    C: QueryClient + ?Sized,
{
    let strategy = &config.backup_strategy;
    info!(
        keys = ?strategy.keys,
        recursive = strategy.recursive,
        sorted = strategy.sorted,
        path = %config.dump_file_path.display(),
        "Starting dump"
    );

    let records = download_data_set(strategy, client, progress)
        .await
        .context("Failed to download data set");
    progress.finished();
    let records = records?;

    dump_data_set(&records, &config.dump_file_path).with_context(|| {
        format!(
            "Failed to write snapshot: {}",
            config.dump_file_path.display()
        )
    })?;

    Ok(DumpSummary {
        records: records.len(),
        path: config.dump_file_path.clone(),
        bytes: file_size(&config.dump_file_path),
    })
}
