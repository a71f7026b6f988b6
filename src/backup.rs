//! Flatten a store's key tree into an ordered list of records.
//!
//! Each key of the [`BackupStrategy`] is queried in order. Recursive
//! strategies emit the leaves of the returned subtree depth-first (a node
//! with children is never emitted itself, so empty directories survive as
//! directory records while populated ones are implied by their leaves).
//! Non-recursive strategies emit the queried node alone.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::record::{Record, RecordKind};
use crate::store::{Node, QueryClient};
use crate::strategy::BackupStrategy;

/// Query every key of `strategy` and collect the resulting records.
///
/// # Errors
///
/// Returns [`Error::Query`] naming the key as soon as one query fails; no
/// partial data set is returned.
pub async fn download_data_set<C>(
    strategy: &BackupStrategy,
    client: &C,
    progress: &dyn Progress,
) -> Result<Vec<Record>>
where
    C: QueryClient + ?Sized,
{
    let mut records = Vec::new();

    for key in &strategy.keys {
        debug!(
            key = %key,
            sorted = strategy.sorted,
            recursive = strategy.recursive,
            "Querying key"
        );

        let node = client
            .get(key, strategy.sorted, strategy.recursive)
            .await
            .map_err(|e| Error::query(key, e))?;

        records.extend(extract_nodes(&node, strategy));
        progress.extracted(key, records.len());
    }

    info!(total = records.len(), "Data set downloaded");
    Ok(records)
}

/// Convert a queried node into records according to the strategy mode.
pub fn extract_nodes(node: &Node, strategy: &BackupStrategy) -> Vec<Record> {
    if strategy.recursive {
        let mut records = Vec::new();
        collect_leaves(node, &mut records);
        records
    } else {
        vec![node_to_record(node)]
    }
}

/// Depth-first walk appending childless nodes, skipping empty keys.
fn collect_leaves(node: &Node, records: &mut Vec<Record>) {
    if node.nodes.is_empty() {
        if !node.key.is_empty() {
            records.push(node_to_record(node));
        }
        return;
    }

    for child in &node.nodes {
        collect_leaves(child, records);
    }
}

/// Convert a single node, ignoring its children.
///
/// Directories and keyless placeholder nodes become directory records;
/// everything else keeps its value (an absent value reads as empty).
pub fn node_to_record(node: &Node) -> Record {
    let kind = if node.dir || node.key.is_empty() {
        RecordKind::Directory
    } else {
        RecordKind::Leaf(node.value.clone().unwrap_or_default())
    };

    Record {
        key: node.key.clone(),
        kind,
        expiration: node.expiration,
    }
}
