//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `dirmeta`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `dirmeta` library.
//!
//! Commands that read a source tree share [`ProjectArgs`] for locating the
//! configuration file and the input root.

pub mod completions;
pub mod layers;
pub mod resolve;
pub mod tree;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::debug;

use dirmeta::config::{self, Config};
use dirmeta::defaults::{default_config_path, DEFAULT_CONFIG_FILENAME};
use dirmeta::filesystem::SourceTree;

/// Options locating the configuration and the source tree.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the .dirmeta.yaml configuration file.
    ///
    /// Without this flag, `.dirmeta.yaml` in the current directory is used
    /// when present, and the built-in defaults otherwise.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input root to read, overriding the configuration's `input`.
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,
}

/// A loaded configuration and the input root it applies to.
#[derive(Debug)]
pub struct Project {
    pub config: Config,
    pub root: PathBuf,
}

impl ProjectArgs {
    /// Load the configuration and resolve the input root.
    pub fn load(&self) -> Result<Project> {
        let (config, root) = match &self.config {
            Some(path) => load_config_file(path)?,
            None => {
                let path = default_config_path(Path::new("."));
                if path.is_file() {
                    load_config_file(&path)?
                } else {
                    debug!("No {} found; using defaults", DEFAULT_CONFIG_FILENAME);
                    let config = Config::default();
                    let root = config.input.clone();
                    (config, root)
                }
            }
        };
        let root = self.input.clone().unwrap_or(root);
        Ok(Project { config, root })
    }
}

impl Project {
    /// Read the input root into memory.
    pub fn source_tree(&self) -> Result<SourceTree> {
        if !self.root.is_dir() {
            anyhow::bail!("Input directory not found: {}", self.root.display());
        }
        SourceTree::load_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))
    }
}

fn load_config_file(path: &Path) -> Result<(Config, PathBuf)> {
    if !path.is_file() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    let config = config::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let root = config.input_root(path);
    Ok((config, root))
}
