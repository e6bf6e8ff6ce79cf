//! # dirmeta
//!
//! Directory-scoped metadata for document pipelines. Metadata documents
//! placed in a directory of a source tree apply to the content items in that
//! directory and, when recursive, to everything below it. Closer directories
//! win over farther ones, and an item's own metadata wins over both unless a
//! document is marked as overriding.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use dirmeta::directory::DirectoryMetadataEntry;
//! use dirmeta::item::{Content, Item};
//! use dirmeta::metadata::Metadata;
//! use dirmeta::phases::apply::{self, ApplyOptions};
//!
//! let items = vec![Arc::new(Item::new(
//!     "blog/post.md",
//!     Content::from("Hello"),
//!     Metadata::from_pairs([("title", "Post")]),
//! ))];
//! let entries = vec![
//!     DirectoryMetadataEntry::new("", [("author", "Site Team"), ("title", "Untitled")])
//!         .unwrap()
//!         .recursive(true),
//!     DirectoryMetadataEntry::new("blog", [("section", "Blog")]).unwrap(),
//! ];
//!
//! let enriched = apply::execute(&items, entries, &ApplyOptions::default()).unwrap();
//! let metadata = enriched[0].metadata();
//! assert_eq!(metadata.get_as::<String>("title", String::new()), "Post");
//! assert_eq!(metadata.get_as::<String>("author", String::new()), "Site Team");
//! assert_eq!(metadata.get_as::<String>("section", String::new()), "Blog");
//! ```
//!
//! ## Core Concepts
//!
//! - **Values (`value`, `metadata`)**: Typed metadata values, plain or
//!   deferred (computed on read, optionally cached), held in an immutable,
//!   order-preserving store that shares storage between copies.
//! - **Items (`item`)**: Immutable units of content with an optional source
//!   path and metadata. Every derived copy gets a fresh identity.
//! - **Directory metadata (`directory`)**: Entries owned by a directory,
//!   indexed once per batch, and the resolver that layers them onto an item.
//! - **Phases (`phases`)**: Discovery from a source tree, the parallel apply
//!   phase, and output to a sink.
//! - **Configuration (`config`)**: The `.dirmeta.yaml` file naming the
//!   content globs and the directory metadata conventions.

pub mod cancel;
pub mod config;
pub mod defaults;
pub mod directory;
pub mod error;
pub mod filesystem;
pub mod frontmatter;
pub mod item;
pub mod metadata;
pub mod path;
pub mod phases;
pub mod value;

#[cfg(test)]
mod path_proptest;
