//! # Layers Command Implementation
//!
//! This module implements the `layers` subcommand, which explains where an
//! item's directory metadata comes from. It lists every directory metadata
//! document that applies to a path, in the order the documents are layered
//! onto the item (farthest first, so later lines win), with their flags and
//! keys.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::ProjectArgs;
use dirmeta::cancel::CancellationToken;
use dirmeta::directory::{applicable_entries, DirectoryIndex, DirectoryMetadataEntry};
use dirmeta::path::directory_of;
use dirmeta::phases::discovery::{DirectoryMetadataProvider, TreeProvider};

/// Show the directory metadata documents that apply to a path
#[derive(Args, Debug)]
pub struct LayersArgs {
    /// Path of a content item, relative to the input root.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Execute the `layers` command.
pub fn execute(args: LayersArgs) -> Result<()> {
    let stdout = io::stdout();
    run(&args, &mut stdout.lock())
}

pub fn run<W: Write>(args: &LayersArgs, out: &mut W) -> Result<()> {
    let project = args.project.load()?;
    let tree = project.source_tree()?;
    let entries = TreeProvider::new(&tree, &project.config)?
        .directory_metadata()
        .context("Failed to read directory metadata")?;
    let index = DirectoryIndex::build(entries);

    let directory = directory_of(&args.path)
        .with_context(|| format!("Invalid item path: {}", args.path.display()))?;
    let layers = applicable_entries(&directory, &index, &CancellationToken::new())?;

    if layers.is_empty() {
        writeln!(out, "No directory metadata applies to {}", args.path.display())?;
        return Ok(());
    }
    writeln!(
        out,
        "Directory metadata for {} ({} layer(s), later layers win):",
        args.path.display(),
        layers.len()
    )?;
    for (position, layer) in layers.iter().enumerate() {
        writeln!(out, "{}. {}", position + 1, describe_layer(layer))?;
    }
    Ok(())
}

fn describe_layer(entry: &DirectoryMetadataEntry) -> String {
    let mut flags = Vec::new();
    if entry.is_recursive() {
        flags.push("recursive");
    }
    if entry.is_override() {
        flags.push("override");
    }
    let keys: Vec<&str> = entry.pairs().iter().map(|(k, _)| k.as_str()).collect();
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!("{}{}: {}", entry.describe(), flags, keys.join(", "))
}
