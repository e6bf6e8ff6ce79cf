//! Path manipulation utilities for dirmeta
//!
//! Directory metadata is keyed by directory path relative to the input root.
//! Those keys are normalized strings: `/`-separated, no `.` segments, no
//! leading or trailing separator, and `""` for the root itself. Keeping a
//! single textual form means `docs/guide`, `./docs/guide/` and
//! `docs\guide` all land on the same index entry.

use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};

/// The normalized path of the input root.
pub const ROOT_DIR: &str = "";

/// Compile a glob pattern for [`matches_compiled`].
pub fn compile_glob(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(Error::Glob)
}

/// Match a path against a compiled glob pattern.
///
/// `*` does not cross directory separators; use `**` for that.
pub fn matches_compiled(pattern: &Pattern, path: &str) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    pattern.matches_with(path, options)
}

/// Normalize a relative path to its index form.
///
/// `.` segments are dropped and `..` pops the previous segment. Absolute
/// paths and paths that climb above the root are rejected.
pub fn normalize_relative<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let text = path.to_string_lossy().replace('\\', "/");
    let mut segments: Vec<String> = Vec::new();

    for component in Path::new(&text).components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(Error::Path {
                        message: format!("Path escapes the input root: {}", path.display()),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::Path {
                    message: format!("Expected a relative path: {}", path.display()),
                });
            }
        }
    }

    Ok(segments.join("/"))
}

/// Parent of a normalized directory path, or `None` for the root.
pub fn parent_dir(dir: &str) -> Option<&str> {
    if dir == ROOT_DIR {
        return None;
    }
    Some(match dir.rfind('/') {
        Some(pos) => &dir[..pos],
        None => ROOT_DIR,
    })
}

/// Normalized directory containing a relative file path.
pub fn directory_of<P: AsRef<Path>>(file: P) -> Result<String> {
    let normalized = normalize_relative(file)?;
    Ok(parent_dir(&normalized).unwrap_or(ROOT_DIR).to_string())
}

/// Number of segments in a normalized directory path.
pub fn depth(dir: &str) -> usize {
    if dir == ROOT_DIR {
        0
    } else {
        dir.split('/').count()
    }
}
