//! # Error Handling
//!
//! This module defines the centralized error type for `dirmeta`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the library can report, each variant carrying enough context to explain
//! the problem to a user.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum of all possible errors.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Only a few of these errors can come out of the metadata core itself:
//! conversion failures are recovered locally by the typed getters, and a
//! missing directory index entry is simply "no contribution". What remains
//! is deferred-value evaluation failures and cancellation. Everything else
//! belongs to the collaborators around the core (configuration, reading the
//! source tree, parsing metadata documents, writing reports).

use thiserror::Error;

/// Main error type for dirmeta operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing the `.dirmeta.yaml` configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A deferred metadata value failed to compute.
    #[error("Metadata evaluation error for key '{key}': {message}")]
    MetadataEvaluation { key: String, message: String },

    /// A metadata document or front matter block could not be parsed.
    #[error("Metadata parsing error in {path}: {message}")]
    MetadataParse { path: String, message: String },

    /// An error occurred with a source tree operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// The batch was cancelled before every item was resolved.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error occurred during serialization.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Shorthand for building a [`Error::MetadataEvaluation`].
    pub fn evaluation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MetadataEvaluation {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_parse() {
        let error = Error::ConfigParse {
            message: "Invalid YAML".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("Invalid YAML"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "Invalid pattern".to_string(),
            hint: Some("Quote glob patterns in YAML".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid pattern"));
        assert!(display.contains("hint:"));
        assert!(display.contains("Quote glob patterns"));
    }

    #[test]
    fn test_error_display_metadata_evaluation() {
        let error = Error::evaluation("title", "division by zero");
        let display = format!("{}", error);
        assert!(display.contains("Metadata evaluation error"));
        assert!(display.contains("'title'"));
        assert!(display.contains("division by zero"));
    }

    #[test]
    fn test_error_display_metadata_parse() {
        let error = Error::MetadataParse {
            path: "docs/_directory.yaml".to_string(),
            message: "expected a mapping".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("docs/_directory.yaml"));
        assert!(display.contains("expected a mapping"));
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML parsing error"));
    }

    #[test]
    fn test_error_from_glob_error() {
        let glob_error = glob::Pattern::new("[invalid").unwrap_err();
        let error: Error = glob_error.into();
        assert!(error.to_string().contains("Glob pattern error"));
    }
}
