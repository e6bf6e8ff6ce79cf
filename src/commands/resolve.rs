//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which runs the whole
//! pipeline over the input root and prints every content item with its
//! resolved metadata.
//!
//! ## Functionality
//!
//! - **Full Run**: Discovers directory metadata documents and content items,
//!   applies the cascade, and reports the result.
//! - **Filtering**: `--pattern` limits the report to items whose source path
//!   matches a glob.
//! - **Formats**: JSON lines (default) or a YAML sequence.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glob::Pattern;

use super::ProjectArgs;
use dirmeta::cancel::CancellationToken;
use dirmeta::config::FailurePolicy;
use dirmeta::item::Item;
use dirmeta::path::matches_compiled;
use dirmeta::phases::orchestrator;
use dirmeta::phases::output::{ItemSink, ReportFormat, ReportSink};
use dirmeta::phases::RunSummary;

/// Output formats for the report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// A YAML sequence
    Yaml,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Yaml => ReportFormat::Yaml,
        }
    }
}

/// Print every content item with its resolved metadata
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Only report items whose path matches this glob.
    #[arg(short, long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Override the configuration's failure policy
    /// (omit-key, keep-original, abort).
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let stdout = io::stdout();
    run(&args, stdout.lock())?;
    Ok(())
}

/// Run the pipeline and write the report to `out`.
pub fn run<W: Write>(args: &ResolveArgs, out: W) -> Result<RunSummary> {
    let mut project = args.project.load()?;
    if let Some(policy) = args.failure_policy {
        project.config.failure_policy = policy;
    }
    let filter = args
        .pattern
        .as_deref()
        .map(Pattern::new)
        .transpose()
        .context("Invalid --pattern")?;

    let tree = project.source_tree()?;
    let mut sink = FilteredSink {
        filter,
        inner: ReportSink::new(out, args.format.into()),
    };
    let summary = orchestrator::execute(
        &project.config,
        &tree,
        &mut sink,
        &CancellationToken::new(),
    )
    .context("Failed to resolve directory metadata")?;
    Ok(summary)
}

/// Forwards only the items whose source matches `filter`.
struct FilteredSink<S> {
    filter: Option<Pattern>,
    inner: S,
}

impl<S: ItemSink> ItemSink for FilteredSink<S> {
    fn accept(&mut self, item: Arc<Item>) -> dirmeta::error::Result<()> {
        let keep = match (&self.filter, item.source()) {
            (None, _) => true,
            (Some(pattern), Some(source)) => {
                matches_compiled(pattern, &source.to_string_lossy())
            }
            (Some(_), None) => false,
        };
        if keep {
            self.inner.accept(item)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> dirmeta::error::Result<()> {
        self.inner.finish()
    }
}
