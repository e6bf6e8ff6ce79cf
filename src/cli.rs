//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use dirmeta::defaults::DEFAULT_LOG_LEVEL;

/// dirmeta - Cascade directory metadata onto the documents of a source tree
#[derive(Parser, Debug)]
#[command(name = "dirmeta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every content item with its resolved metadata
    Resolve(commands::resolve::ResolveArgs),

    /// Show the directory metadata documents that apply to a path
    Layers(commands::layers::LayersArgs),

    /// Show the directory metadata documents of the source tree as a tree
    Tree(commands::tree::TreeArgs),

    /// Validate a .dirmeta.yaml configuration and its metadata documents
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args),
            Commands::Layers(args) => commands::layers::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Route `log` output to stderr at `level`, unless `RUST_LOG` says otherwise.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp(None);
    // A logger may already be installed when running under tests.
    let _ = builder.try_init();
}
