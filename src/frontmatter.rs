//! YAML metadata parsing
//!
//! Two shapes of metadata are read from the source tree:
//!
//! - **Directory metadata documents**: the whole file is a YAML mapping.
//! - **Content items**: an optional front matter block fenced by `---`
//!   lines at the very start of the file, followed by the body.
//!
//! Both produce ordered `(key, Value)` pairs; document order is kept so
//! enumeration of the resulting store matches what the author wrote.

use crate::error::{Error, Result};
use crate::value::{yaml_key_to_string, Value};

const FENCE: &str = "---";

/// Split a leading front matter block from `text`.
///
/// Returns the YAML between the fences (if any) and the remaining body.
/// Text without an opening fence, or with an unterminated one, is all body.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return (None, text);
    };
    // The opening fence must be alone on its line.
    let rest = match rest.find('\n') {
        Some(pos) if rest[..pos].trim().is_empty() => &rest[pos + 1..],
        _ => return (None, text),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

/// Parse a YAML mapping into ordered pairs.
///
/// An empty document yields no pairs. Anything other than a mapping is an
/// error naming `origin`.
pub fn parse_pairs(yaml: &str, origin: &str) -> Result<Vec<(String, Value)>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| Error::MetadataParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

    match parsed {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Mapping(mapping) => Ok(mapping
            .into_iter()
            .map(|(k, v)| (yaml_key_to_string(k), Value::from_yaml(v)))
            .collect()),
        other => Err(Error::MetadataParse {
            path: origin.to_string(),
            message: format!(
                "expected a mapping of metadata keys, found {}",
                Value::from_yaml(other).type_name()
            ),
        }),
    }
}

/// Parse a content file into its front matter pairs and body.
pub fn parse_content(text: &str, origin: &str) -> Result<(Vec<(String, Value)>, String)> {
    match split_front_matter(text) {
        (Some(yaml), body) => Ok((parse_pairs(yaml, origin)?, body.to_string())),
        (None, body) => Ok((Vec::new(), body.to_string())),
    }
}
