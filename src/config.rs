//! # Configuration Schema and Parsing
//!
//! This module defines the `.dirmeta.yaml` configuration file and its
//! parsing. The configuration tells the source tree provider which files
//! are content items and which are directory metadata documents, and tells
//! the apply phase how to react to metadata that fails to compute.
//!
//! ```yaml
//! input: content
//! content: ["**/*.md"]
//! directory_metadata:
//!   - pattern: "**/_directory.yaml"
//!     recursive: true
//!   - pattern: "**/local.metadata"
//!     recursive: false
//!     override: true
//! failure_policy: omit-key
//! ```
//!
//! Every field is optional. An empty file is a valid configuration that
//! treats every file as content and `**/_directory.yaml` as recursive
//! directory metadata.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the apply phase handles a deferred value that fails to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure and drop the key from that one item.
    #[default]
    OmitKey,
    /// Log the failure and emit the item without any directory metadata.
    KeepOriginal,
    /// Fail the whole batch.
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "omit-key" => Ok(FailurePolicy::OmitKey),
            "keep-original" => Ok(FailurePolicy::KeepOriginal),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(Error::ConfigParse {
                message: format!("Unknown failure policy '{}'", other),
                hint: Some("Use one of: omit-key, keep-original, abort".to_string()),
            }),
        }
    }
}

/// A naming convention for directory metadata documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryMetadataRule {
    /// Glob matched against paths relative to the input root.
    pub pattern: String,
    /// Whether matching documents cascade to subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Whether matching documents may replace an item's own values.
    #[serde(default, rename = "override")]
    pub override_existing: bool,
}

impl DirectoryMetadataRule {
    pub fn new(pattern: &str, recursive: bool, override_existing: bool) -> Self {
        Self {
            pattern: pattern.to_string(),
            recursive,
            override_existing,
        }
    }
}

/// The root `.dirmeta.yaml` structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Input root, relative to the configuration file.
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Globs selecting content items.
    #[serde(default = "default_content")]
    pub content: Vec<String>,
    /// Directory metadata naming conventions, in precedence order within a
    /// directory (later rules win).
    #[serde(default = "default_rules")]
    pub directory_metadata: Vec<DirectoryMetadataRule>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            content: default_content(),
            directory_metadata: default_rules(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_input() -> PathBuf {
    PathBuf::from(".")
}

fn default_content() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_rules() -> Vec<DirectoryMetadataRule> {
    vec![DirectoryMetadataRule::new("**/_directory.yaml", true, false)]
}

impl Config {
    /// Check the configuration for problems serde cannot catch.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(Error::ConfigParse {
                message: "'content' must list at least one pattern".to_string(),
                hint: Some("Use \"**/*\" to treat every file as content".to_string()),
            });
        }
        if self.directory_metadata.is_empty() {
            return Err(Error::ConfigParse {
                message: "'directory_metadata' must list at least one rule".to_string(),
                hint: Some("Add a rule such as: - pattern: \"**/_directory.yaml\"".to_string()),
            });
        }

        let rule_patterns = self.directory_metadata.iter().map(|r| &r.pattern);
        for pattern in self.content.iter().chain(rule_patterns) {
            Pattern::new(pattern).map_err(|e| Error::ConfigParse {
                message: format!("Invalid glob pattern '{}': {}", pattern, e),
                hint: Some("Check brackets and quote patterns in YAML".to_string()),
            })?;
        }
        Ok(())
    }

    /// Input root for a configuration loaded from `config_path`.
    pub fn input_root(&self, config_path: &Path) -> PathBuf {
        if self.input.is_absolute() {
            return self.input.clone();
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.input)
    }
}

/// Parse a configuration from YAML text and validate it.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config = if yaml_content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: None,
        })?
    };
    config.validate()?;
    Ok(config)
}

/// Parse a configuration from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
