//! Phase 2: Apply Directory Metadata
//!
//! This is the second phase of a dirmeta run and the heart of the
//! pipeline. It enriches a batch of items with the directory metadata that
//! applies to each of them.
//!
//! ## Process
//!
//! 1.  **Indexing**: All directory metadata entries for the batch are
//!     grouped by owning directory into a [`DirectoryIndex`], once. The
//!     index is read-only from here on.
//!
//! 2.  **Resolution**: Every item is resolved against the index with
//!     [`resolve_item`], in parallel using `rayon`. Items share nothing but
//!     the index, so no locking is involved. Results are collected in input
//!     order.
//!
//! 3.  **Settling**: Deferred values contributed by directory metadata are
//!     computed once against the resolved item. A value that fails to
//!     compute is handled per [`FailurePolicy`]: dropped from that item,
//!     the item reverted to its unresolved form, or the batch aborted.
//!
//! The phase produces a new batch one-to-one with the input. Items that
//! received no directory metadata are passed through as the same `Arc`.
//! If the batch is cancelled, or aborted by the failure policy, no output
//! is produced at all.

use std::sync::Arc;

use log::{info, warn};
use rayon::prelude::*;

use super::Batch;
use crate::cancel::CancellationToken;
use crate::config::FailurePolicy;
use crate::directory::{resolve_item, DirectoryIndex, DirectoryMetadataEntry, Resolution};
use crate::error::Result;
use crate::item::Item;

/// Settings for one apply run.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub failure_policy: FailurePolicy,
    pub cancel: CancellationToken,
}

impl ApplyOptions {
    pub fn new(failure_policy: FailurePolicy) -> Self {
        Self {
            failure_policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Executes Phase 2 of the pipeline.
///
/// Builds the directory index from `entries` and resolves every item in
/// `items` against it.
pub fn execute(
    items: &[Arc<Item>],
    entries: Vec<DirectoryMetadataEntry>,
    options: &ApplyOptions,
) -> Result<Batch> {
    let index = DirectoryIndex::build(entries);
    execute_with_index(items, &index, options)
}

/// Resolve every item against a prebuilt index.
pub fn execute_with_index(
    items: &[Arc<Item>],
    index: &DirectoryIndex,
    options: &ApplyOptions,
) -> Result<Batch> {
    let resolved = items
        .par_iter()
        .map(|item| apply_one(item, index, options))
        .collect::<Result<Batch>>()?;

    let enriched = items
        .iter()
        .zip(&resolved)
        .filter(|(before, after)| !Arc::ptr_eq(before, after))
        .count();
    info!(
        "Applied {} directory metadata document(s) to {} of {} item(s)",
        index.len(),
        enriched,
        items.len()
    );
    Ok(resolved)
}

fn apply_one(
    item: &Arc<Item>,
    index: &DirectoryIndex,
    options: &ApplyOptions,
) -> Result<Arc<Item>> {
    options.cancel.check()?;
    let resolution = resolve_item(item, index, &options.cancel)?;
    if !resolution.is_modified() {
        return Ok(resolution.item);
    }
    settle(item, resolution, options.failure_policy)
}

/// Compute the deferred values the applied layers put on the item.
fn settle(
    original: &Arc<Item>,
    resolution: Resolution,
    policy: FailurePolicy,
) -> Result<Arc<Item>> {
    let resolved = &resolution.item;
    let metadata = resolved.metadata();
    let mut failed: Vec<&str> = Vec::new();

    for contribution in &resolution.deferred {
        let key = contribution.key.as_str();
        if failed.contains(&key) {
            continue;
        }
        // Skip values a later layer replaced.
        let Some(slot) = metadata.get_raw(key) else {
            continue;
        };
        if !slot.ptr_eq(&contribution.value) {
            continue;
        }
        if let Err(e) = slot.resolve(key, metadata) {
            if policy == FailurePolicy::Abort {
                return Err(e);
            }
            warn!(
                "Failed to compute metadata '{}' for {} (from {}): {}",
                key,
                resolved.display_source(),
                contribution.layer.describe(),
                e
            );
            failed.push(key);
        }
    }

    if failed.is_empty() {
        return Ok(Arc::clone(resolved));
    }
    match policy {
        FailurePolicy::KeepOriginal => Ok(Arc::clone(original)),
        FailurePolicy::OmitKey | FailurePolicy::Abort => Ok(Arc::new(
            resolved.clone_with_metadata(metadata.without(failed)),
        )),
    }
}
