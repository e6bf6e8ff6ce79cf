//! Property-based tests for directory metadata resolution.
//!
//! Items are placed at random depths under randomly populated directory
//! lineages, and the resolved value of a single key is checked against the
//! layering rules.

use std::sync::Arc;

use proptest::prelude::*;

use crate::cancel::CancellationToken;
use crate::directory::{resolve_item, DirectoryIndex, DirectoryMetadataEntry};
use crate::item::{Content, Item};
use crate::metadata::Metadata;
use crate::value::Value;

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9]{1,4}", 0..6)
}

/// Every directory from the root down to `parts`, root first.
fn lineage(parts: &[String]) -> Vec<String> {
    (0..=parts.len()).map(|n| parts[..n].join("/")).collect()
}

fn page_in(dir: &str) -> String {
    if dir.is_empty() {
        "page.md".to_string()
    } else {
        format!("{}/page.md", dir)
    }
}

fn resolved_k(item: Item, entries: Vec<DirectoryMetadataEntry>) -> Option<Value> {
    let index = DirectoryIndex::build(entries);
    let resolution = resolve_item(&Arc::new(item), &index, &CancellationToken::new()).unwrap();
    resolution.item.metadata().get("k").unwrap()
}

proptest! {
    /// Property: among recursive entries on the lineage, the closest wins
    #[test]
    fn closest_directory_wins(parts in segments(), mask in prop::collection::vec(any::<bool>(), 6)) {
        let dirs = lineage(&parts);
        let present: Vec<&String> = dirs
            .iter()
            .zip(&mask)
            .filter(|(_, on)| **on)
            .map(|(dir, _)| dir)
            .collect();
        let entries = present
            .iter()
            .map(|dir| {
                DirectoryMetadataEntry::new(dir.as_str(), [("k", dir.as_str())])
                    .unwrap()
                    .recursive(true)
            })
            .collect();

        let item = Item::new(page_in(&parts.join("/")), Content::empty(), Metadata::new());
        let expected = present.last().map(|dir| Value::from(dir.as_str()));
        prop_assert_eq!(resolved_k(item, entries), expected);
    }

    /// Property: non-recursive entries only reach items in their own directory
    #[test]
    fn non_recursive_entries_stay_local(parts in segments(), mask in prop::collection::vec(any::<bool>(), 6)) {
        let dirs = lineage(&parts);
        let entries = dirs
            .iter()
            .zip(&mask)
            .filter(|(_, on)| **on)
            .map(|(dir, _)| DirectoryMetadataEntry::new(dir.as_str(), [("k", dir.as_str())]).unwrap())
            .collect();

        let own_dir = parts.join("/");
        let item = Item::new(page_in(&own_dir), Content::empty(), Metadata::new());
        let expected = if mask[parts.len()] {
            Some(Value::from(own_dir.as_str()))
        } else {
            None
        };
        prop_assert_eq!(resolved_k(item, entries), expected);
    }

    /// Property: an item's own value survives unless the entry overrides,
    /// and the input item is never modified
    #[test]
    fn override_flag_decides_against_own_value(
        parts in segments(),
        level in 0usize..6,
        override_existing in any::<bool>(),
    ) {
        let dirs = lineage(&parts);
        let owner = &dirs[level % dirs.len()];
        let entry = DirectoryMetadataEntry::new(owner.as_str(), [("k", "directory")])
            .unwrap()
            .recursive(true)
            .override_existing(override_existing);

        let item = Arc::new(Item::new(
            page_in(&parts.join("/")),
            Content::empty(),
            Metadata::from_pairs([("k", "own")]),
        ));
        let index = DirectoryIndex::build(vec![entry]);
        let resolution = resolve_item(&item, &index, &CancellationToken::new()).unwrap();

        let expected = if override_existing { "directory" } else { "own" };
        prop_assert_eq!(resolution.item.metadata().get("k").unwrap(), Some(Value::from(expected)));
        prop_assert_eq!(item.metadata().get("k").unwrap(), Some(Value::from("own")));
    }
}
