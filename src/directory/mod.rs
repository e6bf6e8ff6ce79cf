//! # Directory Metadata
//!
//! A directory metadata document attaches key/value pairs to a directory of
//! the input tree. Each document becomes one [`DirectoryMetadataEntry`]
//! carrying two flags:
//!
//! - **recursive**: the entry applies to items in its own directory and in
//!   every directory below it. A non-recursive entry only applies to items
//!   directly in its own directory.
//! - **override**: the entry may replace values the item already had before
//!   resolution started. Without it, the entry only fills in keys the item
//!   does not define itself.
//!
//! Entries for a batch are grouped by directory into a [`DirectoryIndex`]
//! once, before any item is resolved, and never change afterwards. The
//! [`resolver`] module walks an item's directory lineage against that index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::metadata::MetadataValue;
use crate::path::normalize_relative;

pub mod resolver;
#[cfg(test)]
mod resolver_proptest;

pub use resolver::{applicable_entries, resolve_item, Contribution, Resolution};

/// Metadata contributed by one directory metadata document.
#[derive(Debug, Clone)]
pub struct DirectoryMetadataEntry {
    directory: String,
    recursive: bool,
    override_existing: bool,
    pairs: Vec<(String, MetadataValue)>,
    origin: Option<PathBuf>,
}

impl DirectoryMetadataEntry {
    /// Create a non-recursive, non-overriding entry for `directory`
    /// (relative to the input root; `""` is the root).
    pub fn new<P, I, K, V>(directory: P, pairs: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        Ok(Self {
            directory: normalize_relative(directory)?,
            recursive: false,
            override_existing: false,
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            origin: None,
        })
    }

    /// Set whether the entry cascades to subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set whether the entry may replace an item's own values.
    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Record the document this entry was read from.
    pub fn origin<P: Into<PathBuf>>(mut self, origin: P) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn is_override(&self) -> bool {
        self.override_existing
    }

    pub fn pairs(&self) -> &[(String, MetadataValue)] {
        &self.pairs
    }

    pub fn origin_path(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Label for logs and reports: the origin document, or the directory.
    pub fn describe(&self) -> String {
        match &self.origin {
            Some(origin) => origin.display().to_string(),
            None if self.directory.is_empty() => "<root>".to_string(),
            None => format!("<{}>", self.directory),
        }
    }
}

/// Directory metadata entries grouped by owning directory.
///
/// Within a directory, entries keep the order they were supplied in.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    by_directory: HashMap<String, Vec<Arc<DirectoryMetadataEntry>>>,
    len: usize,
}

impl DirectoryIndex {
    /// Group `entries` by directory in a single pass.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DirectoryMetadataEntry>,
    {
        let mut index = Self::default();
        for entry in entries {
            index
                .by_directory
                .entry(entry.directory.clone())
                .or_default()
                .push(Arc::new(entry));
            index.len += 1;
        }
        index
    }

    /// Entries owned by `directory`, in supplied order.
    pub fn entries_for(&self, directory: &str) -> &[Arc<DirectoryMetadataEntry>] {
        self.by_directory
            .get(directory)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Directories that own at least one entry, sorted.
    pub fn directories(&self) -> Vec<&str> {
        let mut dirs: Vec<&str> = self.by_directory.keys().map(String::as_str).collect();
        dirs.sort_unstable();
        dirs
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<DirectoryMetadataEntry> for DirectoryIndex {
    fn from_iter<I: IntoIterator<Item = DirectoryMetadataEntry>>(iter: I) -> Self {
        DirectoryIndex::build(iter)
    }
}
