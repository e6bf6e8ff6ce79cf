//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the
//! directory metadata documents of the source tree in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Directory Hierarchy**: One node per directory that holds directory
//!   metadata, nested under its ancestors (intermediate directories without
//!   documents are shown so the nesting stays readable).
//! - **Document Details**: Each document is listed under its directory with
//!   its `recursive` and `override` flags.
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use ptree::{write_tree, TreeItem};

use super::ProjectArgs;
use dirmeta::directory::DirectoryIndex;
use dirmeta::path::{depth, parent_dir, ROOT_DIR};
use dirmeta::phases::discovery::{DirectoryMetadataProvider, TreeProvider};

/// Display the directory metadata documents as a tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the input root, 1 to show one level of directories, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let stdout = io::stdout();
    run(&args, &mut stdout.lock())
}

pub fn run<W: Write>(args: &TreeArgs, out: &mut W) -> Result<()> {
    let project = args.project.load()?;
    let tree = project.source_tree()?;
    let entries = TreeProvider::new(&tree, &project.config)?
        .directory_metadata()
        .context("Failed to read directory metadata")?;
    let index = DirectoryIndex::build(entries);

    let root = build_tree_node(&index, ROOT_DIR, args.depth.unwrap_or(usize::MAX));
    write_tree(&root, out).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Build the node for `dir` and, up to `max_depth`, its descendants.
fn build_tree_node(index: &DirectoryIndex, dir: &str, max_depth: usize) -> TreeNode {
    let label = if dir == ROOT_DIR {
        "<root>".to_string()
    } else {
        format!("{}/", dir.rsplit('/').next().unwrap_or(dir))
    };

    let mut children: Vec<TreeNode> = index
        .entries_for(dir)
        .iter()
        .map(|entry| {
            let mut label = entry.describe();
            if entry.is_recursive() {
                label.push_str(" (recursive)");
            }
            if entry.is_override() {
                label.push_str(" (override)");
            }
            TreeNode::leaf(label)
        })
        .collect();

    if depth(dir) < max_depth {
        for child in child_dirs(index, dir) {
            children.push(build_tree_node(index, &child, max_depth));
        }
    }
    TreeNode { label, children }
}

/// Directories directly below `dir` that lead to directory metadata.
fn child_dirs(index: &DirectoryIndex, dir: &str) -> BTreeSet<String> {
    let mut children = BTreeSet::new();
    for indexed in index.directories() {
        let mut current = indexed;
        while let Some(parent) = parent_dir(current) {
            if parent == dir {
                children.insert(current.to_string());
                break;
            }
            current = parent;
        }
    }
    children
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: vec![],
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
