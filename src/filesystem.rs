//! In-memory source tree
//!
//! The pipeline reads its input through a [`SourceTree`]: a map from
//! normalized relative paths to file bytes. Tests build trees by hand;
//! the CLI loads one from disk with [`SourceTree::load_dir`].

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::normalize_relative;

/// A file in the source tree
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Content as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.content).map_err(|e| Error::Filesystem {
            message: format!("File is not valid UTF-8: {}", e),
        })
    }
}

/// In-memory view of an input directory.
///
/// Paths are stored in normalized relative form and iterate in sorted
/// order, so discovery over a tree is deterministic.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    files: BTreeMap<String, File>,
}

impl SourceTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular file below `root`.
    ///
    /// Hidden files and directories (names starting with `.`) are skipped.
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Filesystem {
                message: format!("Input directory not found: {}", root.display()),
            });
        }

        let mut tree = Self::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).map_err(|e| Error::Path {
                message: format!("{}: {}", entry.path().display(), e),
            })?;
            let content = std::fs::read(entry.path())?;
            tree.add_file(relative, File::new(content))?;
        }

        debug!("Loaded {} file(s) from {}", tree.len(), root.display());
        Ok(tree)
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        let path = normalize_relative(path)?;
        if path.is_empty() {
            return Err(Error::Filesystem {
                message: "A file path cannot be empty".to_string(),
            });
        }
        self.files.insert(path, file);
        Ok(())
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, file) pairs, sorted by path
    pub fn files(&self) -> impl Iterator<Item = (&str, &File)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
