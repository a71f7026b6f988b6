//! `restore`: replay a snapshot file into the cluster.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::progress::Progress;
use crate::restore::{RestoreStatistics, StatisticsSnapshot, restore_data_set};
use crate::snapshot::load_data_set;
use crate::store::MutationClient;
use crate::ui;
use crate::utils::format_elapsed;

/// Restore into the cluster named in the configuration.
///
/// Statistics are printed whether or not the restore succeeds.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or a key cannot be
/// restored.
pub async fn execute(config: &Config, progress: Arc<dyn Progress>) -> Result<()> {
    let client = Arc::new(super::connect(&config.etcd_config_path)?);
    let started = Utc::now();

    let statistics = run(config, client, progress).await;
    let elapsed = format_elapsed(Utc::now() - started);

    match statistics {
        Ok(statistics) => {
            println!(
                "Restored {} keys from {} in {elapsed}",
                statistics.keys_inserted,
                config.dump_file_path.display()
            );
            ui::print_statistics(&statistics);
            Ok(())
        },
        Err(failure) => {
            if let Some(partial) = failure.statistics {
                warn!(elapsed = %elapsed, "Restore stopped before completion");
                ui::print_statistics(&partial);
            }
            Err(failure.error)
        },
    }
}

/// A failed restore with whatever was done before it stopped.
#[derive(Debug)]
pub struct RestoreFailure {
    pub error: anyhow::Error,
    /// `None` if the snapshot could not be loaded.
    pub statistics: Option<StatisticsSnapshot>,
}

/// Restore into any [`MutationClient`].
///
/// # Errors
///
/// Returns a [`RestoreFailure`] carrying the partial counters.
pub async fn run<C>(
    config: &Config,
    client: Arc<C>,
    progress: Arc<dyn Progress>,
) -> std::result::Result<StatisticsSnapshot, RestoreFailure>
where
    C: MutationClient + ?Sized + 'static,
{
    let records = load_data_set(&config.dump_file_path)
        .with_context(|| {
            format!(
                "Failed to read snapshot: {}",
                config.dump_file_path.display()
            )
        })
        .map_err(|error| RestoreFailure {
            error,
            statistics: None,
        })?;

    let statistics = Arc::new(RestoreStatistics::new(&records));
    restore_data_set(
        records,
        &config.restore_options(),
        client,
        Arc::clone(&statistics),
        progress,
    )
    .await
    .context("Failed to restore data set")
    .map_err(|error| RestoreFailure {
        error,
        statistics: Some(statistics.snapshot()),
    })
}
