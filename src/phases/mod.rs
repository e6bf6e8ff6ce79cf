//! Implementation of the phases of a dirmeta run.
//!
//! ## Overview
//!
//! A run follows 3 phases:
//! 1. Discovery - Read directory metadata documents and content items from
//!    the source tree (in parallel, order preserving)
//! 2. Apply - Index directory metadata by directory once, then resolve every
//!    item against the index in parallel
//! 3. Output - Hand the enriched batch to a sink, in input order
//!
//! The `orchestrator` module chains the phases. Each phase depends only on
//! the previous phases and on the metadata core (`metadata`, `item`,
//! `directory`), and each can be driven on its own: the apply phase takes
//! any batch of items and any set of directory metadata entries, however
//! they were produced.

use std::sync::Arc;

use crate::item::Item;

pub mod apply;
pub mod discovery;
pub mod orchestrator;
pub mod output;

pub use apply as phase2;
pub use discovery as phase1;
pub use output as phase3;

/// A batch of items moving between phases.
pub type Batch = Vec<Arc<Item>>;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Content items processed.
    pub items: usize,
    /// Directory metadata documents indexed.
    pub directory_documents: usize,
    /// Items that received at least one directory metadata layer.
    pub enriched: usize,
}
