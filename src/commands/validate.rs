//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a
//! `.dirmeta.yaml` configuration without running the pipeline.
//!
//! ## Functionality
//!
//! - **Configuration Validation**: Parses the configuration file and checks
//!   its glob patterns and rule lists.
//! - **Document Validation**: With `--documents`, also reads the input root
//!   and parses every directory metadata document and front matter block,
//!   reporting the first malformed one.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;

use super::ProjectArgs;
use dirmeta::phases::discovery::{DirectoryMetadataProvider, ItemSource, TreeProvider};

/// Validate a .dirmeta.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Also parse every directory metadata document and content item.
    #[arg(long)]
    pub documents: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    let stdout = io::stdout();
    run(&args, &mut stdout.lock())
}

pub fn run<W: Write>(args: &ValidateArgs, out: &mut W) -> Result<()> {
    let project = args.project.load().context("Configuration is invalid")?;
    let config = &project.config;

    writeln!(out, "Configuration is valid")?;
    writeln!(out, "   Input root: {}", project.root.display())?;
    writeln!(out, "   Content patterns: {}", config.content.join(", "))?;
    writeln!(out, "   Directory metadata rules:")?;
    for rule in &config.directory_metadata {
        writeln!(
            out,
            "     - {} (recursive: {}, override: {})",
            rule.pattern, rule.recursive, rule.override_existing
        )?;
    }
    writeln!(out, "   Failure policy: {:?}", config.failure_policy)?;

    if args.documents {
        let tree = project.source_tree()?;
        let provider = TreeProvider::new(&tree, config)?;
        let documents = provider
            .directory_metadata()
            .context("Directory metadata is invalid")?;
        let items = provider.items().context("Content front matter is invalid")?;
        writeln!(
            out,
            "Documents are valid: {} directory metadata document(s), {} content item(s)",
            documents.len(),
            items.len()
        )?;
    }
    Ok(())
}
