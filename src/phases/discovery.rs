//! Phase 1: Discovery
//!
//! This is the first phase of a dirmeta run. Its responsibility is to turn
//! raw files into the two inputs the apply phase needs:
//!
//! 1.  **Directory metadata entries**: every file matching a
//!     `directory_metadata` rule is parsed as a YAML mapping and becomes a
//!     [`DirectoryMetadataEntry`] for the directory containing it, carrying
//!     the rule's `recursive` and `override` flags.
//!
//! 2.  **Content items**: every other file matching a `content` pattern
//!     becomes an [`Item`]. A leading front matter block becomes the item's
//!     initial metadata and the rest of the file its content. Files that are
//!     not UTF-8 are passed through as content with no metadata.
//!
//! The phase is expressed as two collaborator traits so the apply phase
//! never depends on where its inputs came from. [`TreeProvider`] implements
//! both over an in-memory [`SourceTree`].
//!
//! ## Ordering
//!
//! Within one directory, entries are ordered by the rule that matched them
//! (rules listed later come later) and then by path. Items are ordered by
//! path. Parsing happens in parallel with `rayon`, but results are
//! collected in that order.

use std::sync::Arc;

use log::debug;
use glob::Pattern;
use rayon::prelude::*;

use super::Batch;
use crate::config::{Config, DirectoryMetadataRule};
use crate::directory::DirectoryMetadataEntry;
use crate::error::Result;
use crate::filesystem::{File, SourceTree};
use crate::frontmatter::{parse_content, parse_pairs};
use crate::item::{Content, Item};
use crate::metadata::Metadata;
use crate::path::{compile_glob, directory_of, matches_compiled};

/// Supplies the directory metadata documents for a batch.
pub trait DirectoryMetadataProvider {
    fn directory_metadata(&self) -> Result<Vec<DirectoryMetadataEntry>>;
}

/// Supplies the content items for a batch.
pub trait ItemSource {
    fn items(&self) -> Result<Batch>;
}

/// Reads directory metadata and content items from a [`SourceTree`].
///
/// The configured globs are compiled once, when the provider is built.
#[derive(Debug)]
pub struct TreeProvider<'a> {
    tree: &'a SourceTree,
    config: &'a Config,
    content: Vec<Pattern>,
    rules: Vec<Pattern>,
}

impl<'a> TreeProvider<'a> {
    pub fn new(tree: &'a SourceTree, config: &'a Config) -> Result<Self> {
        let content = config
            .content
            .iter()
            .map(|pattern| compile_glob(pattern))
            .collect::<Result<Vec<_>>>()?;
        let rules = config
            .directory_metadata
            .iter()
            .map(|rule| compile_glob(&rule.pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            tree,
            config,
            content,
            rules,
        })
    }

    /// Index of the last rule matching `path`.
    fn rule_index(&self, path: &str) -> Option<usize> {
        self.rules
            .iter()
            .rposition(|pattern| matches_compiled(pattern, path))
    }

    fn is_content(&self, path: &str) -> bool {
        self.content
            .iter()
            .any(|pattern| matches_compiled(pattern, path))
    }
}

impl DirectoryMetadataProvider for TreeProvider<'_> {
    fn directory_metadata(&self) -> Result<Vec<DirectoryMetadataEntry>> {
        let mut matched: Vec<(usize, &str, &File)> = Vec::new();
        for (path, file) in self.tree.files() {
            if let Some(idx) = self.rule_index(path) {
                matched.push((idx, path, file));
            }
        }
        // Files arrive sorted by path; a stable sort keeps that within a rule.
        matched.sort_by_key(|(idx, _, _)| *idx);

        let entries = matched
            .par_iter()
            .map(|(idx, path, file)| {
                read_entry(&self.config.directory_metadata[*idx], path, file)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Discovered {} directory metadata document(s)", entries.len());
        Ok(entries)
    }
}

impl ItemSource for TreeProvider<'_> {
    fn items(&self) -> Result<Batch> {
        let mut candidates: Vec<(&str, &File)> = Vec::new();
        for (path, file) in self.tree.files() {
            if self.rule_index(path).is_none() && self.is_content(path) {
                candidates.push((path, file));
            }
        }

        let items = candidates
            .par_iter()
            .map(|(path, file)| read_item(path, file).map(Arc::new))
            .collect::<Result<Batch>>()?;

        debug!("Discovered {} content item(s)", items.len());
        Ok(items)
    }
}

fn read_entry(
    rule: &DirectoryMetadataRule,
    path: &str,
    file: &File,
) -> Result<DirectoryMetadataEntry> {
    let pairs = parse_pairs(file.text()?, path)?;
    Ok(DirectoryMetadataEntry::new(directory_of(path)?, pairs)?
        .recursive(rule.recursive)
        .override_existing(rule.override_existing)
        .origin(path))
}

fn read_item(path: &str, file: &File) -> Result<Item> {
    match file.text() {
        Ok(text) => {
            let (pairs, body) = parse_content(text, path)?;
            Ok(Item::new(path, Content::from(body), Metadata::from_pairs(pairs)))
        }
        Err(_) => {
            debug!("{} is not UTF-8; reading it without front matter", path);
            Ok(Item::new(
                path,
                Content::from_bytes(file.content.clone()),
                Metadata::new(),
            ))
        }
    }
}
