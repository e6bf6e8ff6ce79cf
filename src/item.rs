//! Content items flowing through the pipeline.
//!
//! An [`Item`] bundles an optional source path, an opaque content handle
//! and a [`Metadata`] store. Items are never modified: every change goes
//! through one of the `clone_with*` methods, which return a new item with
//! its own identity and leave the receiver as it was.
//!
//! `Item` deliberately does not implement [`Clone`]. A copy with the same
//! identity would break consumers that key caches on item identity; share
//! an item with `Arc<Item>` instead.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::metadata::{Metadata, MetadataValue};

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content handle. The bytes are shared between an item and its clones.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Content(Option<Arc<[u8]>>);

impl Content {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self(Some(Arc::from(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Whether both handles refer to the same bytes.
    pub fn ptr_eq(&self, other: &Content) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::from_bytes(s.as_bytes())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::from_bytes(s.into_bytes())
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Content({} bytes)", self.len())
    }
}

/// A unit of content with metadata.
#[derive(Debug)]
pub struct Item {
    id: ItemId,
    source: Option<PathBuf>,
    content: Content,
    metadata: Metadata,
}

impl Item {
    /// Create an item read from `source` (relative to the input root).
    pub fn new<P: Into<PathBuf>>(source: P, content: Content, metadata: Metadata) -> Self {
        Self {
            id: ItemId::next(),
            source: Some(source.into()),
            content,
            metadata,
        }
    }

    /// Create an item with no source path.
    pub fn synthesized(content: Content, metadata: Metadata) -> Self {
        Self {
            id: ItemId::next(),
            source: None,
            content,
            metadata,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Source path for log messages.
    pub fn display_source(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => format!("<synthesized {}>", self.id),
        }
    }

    /// New item with `overrides` layered over this item's metadata.
    pub fn clone_with<I, K, V>(&self, overrides: I) -> Item
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        self.derive(
            self.source.clone(),
            self.content.clone(),
            self.metadata.with(overrides),
        )
    }

    /// New item with `overrides` layered over this item's metadata and the
    /// content replaced.
    pub fn clone_with_content<I, K, V>(&self, overrides: I, content: Content) -> Item
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        self.derive(self.source.clone(), content, self.metadata.with(overrides))
    }

    /// New item with a different (or no) source path.
    pub fn clone_with_source(&self, source: Option<PathBuf>) -> Item {
        self.derive(source, self.content.clone(), self.metadata.clone())
    }

    /// New item with the metadata store replaced outright.
    pub fn clone_with_metadata(&self, metadata: Metadata) -> Item {
        self.derive(self.source.clone(), self.content.clone(), metadata)
    }

    fn derive(&self, source: Option<PathBuf>, content: Content, metadata: Metadata) -> Item {
        Item {
            id: ItemId::next(),
            source,
            content,
            metadata,
        }
    }
}
