//! Directory metadata resolution for a single item.
//!
//! ## Algorithm
//!
//! 1. Start at the item's own directory with `is_local_level = true`.
//! 2. At each level, collect the index entries for that directory that
//!    either sit at the local level or are recursive, and push them as one
//!    group onto a stack.
//! 3. Move to the parent directory (no longer local) and repeat, processing
//!    the root exactly once.
//! 4. Pop the stack. Groups come off root-first, so layers apply from the
//!    most general directory to the most specific; inside a group, entries
//!    keep the order the index holds them in.
//!
//! Every layer is folded onto the item with [`Item::clone_with`], so a later
//! layer wins over an earlier one for the same key. A layer without the
//! override flag skips keys the item defined itself before resolution
//! began; it still replaces values contributed by farther directories.
//!
//! Layer values are copied into the item with [`MetadataValue::for_item`],
//! so a cached computation keeps one result per item, not per entry.
//!
//! The walk is an explicit loop so the cancellation token can be checked
//! between directory levels.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace, warn};

use super::{DirectoryIndex, DirectoryMetadataEntry};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::item::Item;
use crate::metadata::MetadataValue;
use crate::path::{directory_of, parent_dir};

/// Outcome of resolving one item.
#[derive(Debug)]
pub struct Resolution {
    /// The resolved item. Identical (same `Arc`) to the input when no layer
    /// applied.
    pub item: Arc<Item>,
    /// Layers that were folded onto the item, in application order.
    pub applied: Vec<Arc<DirectoryMetadataEntry>>,
    /// Deferred values the layers put on the item, as stored in it.
    pub deferred: Vec<Contribution>,
}

/// A deferred value one layer contributed to one item.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub layer: Arc<DirectoryMetadataEntry>,
    pub key: String,
    pub value: MetadataValue,
}

impl Resolution {
    fn unchanged(item: &Arc<Item>) -> Self {
        Self {
            item: Arc::clone(item),
            applied: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Whether any directory metadata was applied.
    pub fn is_modified(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Entries that apply to items in `directory`, in application order
/// (root-most first, declaration order within a directory).
///
/// `directory` must be in normalized form (see [`crate::path`]).
pub fn applicable_entries(
    directory: &str,
    index: &DirectoryIndex,
    cancel: &CancellationToken,
) -> Result<Vec<Arc<DirectoryMetadataEntry>>> {
    let mut levels: Vec<Vec<Arc<DirectoryMetadataEntry>>> = Vec::new();
    let mut is_local_level = true;
    let mut current = directory;

    loop {
        cancel.check()?;

        let level: Vec<_> = index
            .entries_for(current)
            .iter()
            .filter(|entry| is_local_level || entry.is_recursive())
            .cloned()
            .collect();
        if !level.is_empty() {
            trace!("{} layer(s) at '{}' apply to '{}'", level.len(), current, directory);
            levels.push(level);
        }

        match parent_dir(current) {
            Some(parent) => {
                is_local_level = false;
                current = parent;
            }
            None => break,
        }
    }

    let mut ordered = Vec::new();
    while let Some(level) = levels.pop() {
        ordered.extend(level);
    }
    Ok(ordered)
}

/// Resolve directory metadata for one item.
///
/// Items without a source path, and items whose source path cannot be
/// placed under the input root, pass through unchanged.
pub fn resolve_item(
    item: &Arc<Item>,
    index: &DirectoryIndex,
    cancel: &CancellationToken,
) -> Result<Resolution> {
    let Some(source) = item.source() else {
        return Ok(Resolution::unchanged(item));
    };
    if index.is_empty() {
        return Ok(Resolution::unchanged(item));
    }

    let directory = match directory_of(source) {
        Ok(directory) => directory,
        Err(e) => {
            warn!("Skipping directory metadata for {}: {}", source.display(), e);
            return Ok(Resolution::unchanged(item));
        }
    };

    let layers = applicable_entries(&directory, index, cancel)?;
    if layers.is_empty() {
        return Ok(Resolution::unchanged(item));
    }

    debug!(
        "Applying {} directory metadata layer(s) to {}",
        layers.len(),
        source.display()
    );

    let own_keys: HashSet<&str> = item.metadata().keys().collect();
    let mut resolved: Option<Item> = None;
    let mut deferred = Vec::new();
    for layer in &layers {
        let mut overrides: Vec<(String, MetadataValue)> = Vec::with_capacity(layer.pairs().len());
        for (key, value) in layer.pairs() {
            if !layer.is_override() && own_keys.contains(key.as_str()) {
                continue;
            }
            let value = value.for_item();
            if value.is_deferred() {
                deferred.push(Contribution {
                    layer: Arc::clone(layer),
                    key: key.clone(),
                    value: value.clone(),
                });
            }
            overrides.push((key.clone(), value));
        }
        let base = resolved.as_ref().unwrap_or(&**item);
        let next = base.clone_with(overrides);
        resolved = Some(next);
    }

    Ok(Resolution {
        item: resolved.map(Arc::new).unwrap_or_else(|| Arc::clone(item)),
        applied: layers,
        deferred,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Content;
    use crate::metadata::Metadata;
    use crate::value::Value;

    fn item_at(path: &str, pairs: &[(&str, &str)]) -> Arc<Item> {
        Arc::new(Item::new(
            path,
            Content::empty(),
            Metadata::from_pairs(pairs.iter().copied()),
        ))
    }

    fn entry(dir: &str, pairs: &[(&str, &str)]) -> DirectoryMetadataEntry {
        DirectoryMetadataEntry::new(dir, pairs.iter().copied()).unwrap()
    }

    fn resolve(item: &Arc<Item>, index: &DirectoryIndex) -> Resolution {
        resolve_item(item, index, &CancellationToken::new()).unwrap()
    }

    fn value_of(item: &Item, key: &str) -> Option<String> {
        item.metadata().try_get_as::<String>(key).unwrap()
    }

    #[test]
    fn test_closest_directory_wins() {
        let index = DirectoryIndex::build(vec![
            entry("a", &[("k", "a")]).recursive(true),
            entry("a/b", &[("k", "a/b")]).recursive(true),
            entry("a/b/c", &[("k", "a/b/c")]),
        ]);
        let item = item_at("a/b/c/x.md", &[]);

        let resolution = resolve(&item, &index);
        assert_eq!(value_of(&resolution.item, "k").as_deref(), Some("a/b/c"));
        assert_eq!(resolution.applied.len(), 3);
    }

    #[test]
    fn test_application_order_is_root_to_leaf() {
        let index = DirectoryIndex::build(vec![
            entry("a/b", &[("k", "ab")]).recursive(true),
            entry("", &[("k", "root")]).recursive(true),
            entry("a", &[("k", "a")]).recursive(true),
        ]);
        let layers = applicable_entries("a/b", &index, &CancellationToken::new()).unwrap();
        let dirs: Vec<&str> = layers.iter().map(|e| e.directory()).collect();
        assert_eq!(dirs, vec!["", "a", "a/b"]);
    }

    #[test]
    fn test_siblings_apply_in_declaration_order() {
        let index = DirectoryIndex::build(vec![
            entry("docs", &[("k", "first"), ("only_first", "1")]),
            entry("docs", &[("k", "second")]),
        ]);
        let item = item_at("docs/page.md", &[]);

        let resolved = resolve(&item, &index).item;
        assert_eq!(value_of(&resolved, "k").as_deref(), Some("second"));
        assert_eq!(value_of(&resolved, "only_first").as_deref(), Some("1"));
    }

    #[test]
    fn test_override_flag() {
        let item = item_at("docs/page.md", &[("k", "1")]);

        let keep = DirectoryIndex::build(vec![entry("docs", &[("k", "2")])]);
        assert_eq!(value_of(&resolve(&item, &keep).item, "k").as_deref(), Some("1"));

        let replace = DirectoryIndex::build(vec![entry("docs", &[("k", "2")]).override_existing(true)]);
        assert_eq!(value_of(&resolve(&item, &replace).item, "k").as_deref(), Some("2"));
    }

    #[test]
    fn test_non_override_still_fills_missing_keys() {
        let item = item_at("docs/page.md", &[("title", "Mine")]);
        let index = DirectoryIndex::build(vec![entry("docs", &[("title", "Theirs"), ("layout", "doc")])]);

        let resolved = resolve(&item, &index).item;
        assert_eq!(value_of(&resolved, "title").as_deref(), Some("Mine"));
        assert_eq!(value_of(&resolved, "layout").as_deref(), Some("doc"));
    }

    #[test]
    fn test_override_value_survives_closer_non_override_layer() {
        // Root forces the value; the closer layer must not undo the item's
        // protected key even though it is applied later.
        let item = item_at("a/page.md", &[("k", "own")]);
        let index = DirectoryIndex::build(vec![
            entry("", &[("k", "forced")]).recursive(true).override_existing(true),
            entry("a", &[("k", "suggested")]),
        ]);
        assert_eq!(value_of(&resolve(&item, &index).item, "k").as_deref(), Some("forced"));
    }

    #[test]
    fn test_local_entries_do_not_cascade() {
        let index = DirectoryIndex::build(vec![
            entry("a/b", &[("local", "yes")]),
            entry("a/b", &[("inherited", "yes")]).recursive(true),
        ]);

        let direct = resolve(&item_at("a/b/x.md", &[]), &index).item;
        assert_eq!(value_of(&direct, "local").as_deref(), Some("yes"));
        assert_eq!(value_of(&direct, "inherited").as_deref(), Some("yes"));

        let nested = resolve(&item_at("a/b/c/x.md", &[]), &index).item;
        assert_eq!(value_of(&nested, "local"), None);
        assert_eq!(value_of(&nested, "inherited").as_deref(), Some("yes"));
    }

    #[test]
    fn test_pass_through_without_layers() {
        let index = DirectoryIndex::build(vec![entry("other", &[("k", "v")])]);
        let item = item_at("docs/page.md", &[("title", "Same")]);

        let resolution = resolve(&item, &index);
        assert!(!resolution.is_modified());
        assert!(Arc::ptr_eq(&resolution.item, &item));
    }

    #[test]
    fn test_synthesized_item_is_skipped() {
        let index = DirectoryIndex::build(vec![entry("", &[("k", "v")]).recursive(true)]);
        let item = Arc::new(Item::synthesized(Content::empty(), Metadata::new()));

        let resolution = resolve(&item, &index);
        assert!(Arc::ptr_eq(&resolution.item, &item));
        assert!(!resolution.item.metadata().contains_key("k"));
    }

    #[test]
    fn test_source_outside_root_is_skipped() {
        let index = DirectoryIndex::build(vec![entry("", &[("k", "v")]).recursive(true)]);
        let item = item_at("../elsewhere/page.md", &[]);

        let resolution = resolve(&item, &index);
        assert!(Arc::ptr_eq(&resolution.item, &item));
    }

    #[test]
    fn test_original_item_is_not_mutated() {
        let index = DirectoryIndex::build(vec![entry("", &[("added", "v")]).recursive(true)]);
        let item = item_at("page.md", &[("title", "T")]);

        let resolved = resolve(&item, &index).item;
        assert!(!item.metadata().contains_key("added"));
        assert!(resolved.metadata().contains_key("added"));
        assert!(item.metadata().shares_value(resolved.metadata(), "title"));
    }

    #[test]
    fn test_deferred_layer_values_are_kept_unevaluated() {
        let deferred = DirectoryMetadataEntry::new(
            "",
            [("lazy", MetadataValue::deferred(|_, view| {
                Ok(Value::from(format!("for {}", view.get_as::<String>("title", String::new()))))
            }))],
        )
        .unwrap()
        .recursive(true);
        let index = DirectoryIndex::build(vec![deferred]);
        let item = item_at("page.md", &[("title", "Home")]);

        let resolved = resolve(&item, &index).item;
        assert!(resolved.metadata().get_raw("lazy").unwrap().is_deferred());
        assert_eq!(resolved.metadata().get("lazy").unwrap(), Some(Value::from("for Home")));
    }

    #[test]
    fn test_cached_layer_value_is_per_item() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let slug = DirectoryMetadataEntry::new(
            "",
            [("slug", MetadataValue::cached(move |_, view| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(Value::from(view.get_as::<String>("title", String::new()).to_lowercase()))
            }))],
        )
        .unwrap()
        .recursive(true);
        let index = DirectoryIndex::build(vec![slug]);

        let alpha = resolve(&item_at("a.md", &[("title", "Alpha")]), &index);
        let beta = resolve(&item_at("b.md", &[("title", "Beta")]), &index);
        assert_eq!(alpha.deferred.len(), 1);
        assert!(alpha.deferred[0]
            .value
            .ptr_eq(alpha.item.metadata().get_raw("slug").unwrap()));

        for _ in 0..2 {
            assert_eq!(value_of(&alpha.item, "slug").as_deref(), Some("alpha"));
            assert_eq!(value_of(&beta.item, "slug").as_deref(), Some("beta"));
        }
        // Clones of a resolved item share its cache.
        let copy = alpha.item.clone_with(vec![("extra".to_string(), MetadataValue::from("x"))]);
        assert_eq!(value_of(&copy, "slug").as_deref(), Some("alpha"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_walk_fails() {
        let index = DirectoryIndex::build(vec![entry("", &[("k", "v")]).recursive(true)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolve_item(&item_at("a/b/page.md", &[]), &index, &cancel);
        assert!(matches!(result, Err(crate::error::Error::Cancelled)));
    }
}
