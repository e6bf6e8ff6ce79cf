//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_scenario();
//!     fixture.command().arg("resolve").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// The two naming conventions of the reference scenario: `local.metadata`
    /// applies to its own directory only, `inherit.metadata` cascades.
    pub const SCENARIO: &str = r#"
content: ["**/*.md"]
directory_metadata:
  - pattern: "**/local.metadata"
    recursive: false
  - pattern: "**/inherit.metadata"
    recursive: true
"#;

    /// Like [`SCENARIO`], but cascading documents override item values.
    pub const SCENARIO_OVERRIDE: &str = r#"
content: ["**/*.md"]
directory_metadata:
  - pattern: "**/local.metadata"
    recursive: false
  - pattern: "**/inherit.metadata"
    recursive: true
    override: true
"#;

    /// Invalid glob in the content patterns.
    pub const INVALID_PATTERN: &str = r#"
content: ["[oops"]
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "content: [unclosed";
}

/// A test fixture that provides a temporary directory with optional config.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::SCENARIO)
///     .with_file("site.md", "hello world");
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.dirmeta.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".dirmeta.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Populate the reference scenario: one document of each convention at
    /// the root and in `1/`, and a `site.md` item in each.
    pub fn with_scenario(self) -> Self {
        self.with_config(configs::SCENARIO)
            .with_file("site.md", "---\ntitle: Root site\n---\nroot")
            .with_file("local.metadata", "local: root\nshared: root-local\n")
            .with_file("inherit.metadata", "inherit: root\nshared: root-inherit\n")
            .with_file("1/site.md", "---\ninherit: own\n---\nnested")
            .with_file("1/local.metadata", "local: one\n")
            .with_file("1/inherit.metadata", "nested: one\n")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".dirmeta.yaml")
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dirmeta");
        cmd.current_dir(self.path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
