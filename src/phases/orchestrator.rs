//! Orchestrator for a complete dirmeta run
//!
//! This module chains the phases into one call: read a source tree, enrich
//! its items with directory metadata, and hand them to a sink.

use std::sync::Arc;

use log::info;

use super::discovery::{DirectoryMetadataProvider, ItemSource, TreeProvider};
use super::output::ItemSink;
use super::{phase2, RunSummary};
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::error::Result;
use crate::filesystem::SourceTree;

/// Execute a complete run (Phases 1-3)
///
/// 1. Discover directory metadata documents and content items in `tree`
/// 2. Resolve every item against the directory metadata
/// 3. Feed the enriched items, in discovery order, to `sink`
///
/// Nothing reaches the sink if the run fails or is cancelled before the
/// apply phase completes.
pub fn execute(
    config: &Config,
    tree: &SourceTree,
    sink: &mut dyn ItemSink,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let provider = TreeProvider::new(tree, config)?;
    execute_with(&provider, &provider, config, sink, cancel)
}

/// Execute a run over arbitrary collaborators.
pub fn execute_with(
    documents: &dyn DirectoryMetadataProvider,
    source: &dyn ItemSource,
    config: &Config,
    sink: &mut dyn ItemSink,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    // Phase 1: Discovery
    let entries = documents.directory_metadata()?;
    let items = source.items()?;
    cancel.check()?;

    let mut summary = RunSummary {
        items: items.len(),
        directory_documents: entries.len(),
        enriched: 0,
    };

    // Phase 2: Apply
    let options = phase2::ApplyOptions::new(config.failure_policy).with_cancel(cancel.clone());
    let enriched = phase2::execute(&items, entries, &options)?;

    // Phase 3: Output
    for (before, after) in items.iter().zip(enriched) {
        if !Arc::ptr_eq(before, &after) {
            summary.enriched += 1;
        }
        sink.accept(after)?;
    }
    sink.finish()?;

    info!(
        "Processed {} item(s) with {} directory metadata document(s); {} enriched",
        summary.items, summary.directory_documents, summary.enriched
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, FailurePolicy};
    use crate::directory::DirectoryMetadataEntry;
    use crate::error::Error;
    use crate::item::{Content, Item};
    use crate::metadata::Metadata;
    use crate::phases::output::CollectingSink;
    use crate::phases::Batch;

    fn site_tree() -> SourceTree {
        let mut tree = SourceTree::new();
        tree.add_file_string("_directory.yaml", "site: Example\n").unwrap();
        tree.add_file_string("index.md", "---\ntitle: Home\n---\nWelcome").unwrap();
        tree.add_file_string("blog/_directory.yaml", "section: blog\n").unwrap();
        tree.add_file_string("blog/first.md", "First post").unwrap();
        tree.add_file_string("about.txt", "plain").unwrap();
        tree
    }

    #[test]
    fn test_execute_enriches_items_in_order() {
        let tree = site_tree();
        let config = config::parse("content: [\"**/*.md\"]\n").unwrap();
        let mut sink = CollectingSink::new();

        let summary = execute(&config, &tree, &mut sink, &CancellationToken::new()).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                items: 2,
                directory_documents: 2,
                enriched: 2,
            }
        );

        let items = sink.into_items();
        assert_eq!(items[0].display_source(), "blog/first.md");
        let blog = items[0].metadata();
        assert_eq!(blog.get_as::<String>("site", String::new()), "Example");
        assert_eq!(blog.get_as::<String>("section", String::new()), "blog");

        let index = items[1].metadata();
        assert_eq!(index.get_as::<String>("title", String::new()), "Home");
        assert!(!index.contains_key("section"));
    }

    #[test]
    fn test_execute_cancelled_emits_nothing() {
        let tree = site_tree();
        let config = Config::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut sink = CollectingSink::new();

        let result = execute(&config, &tree, &mut sink, &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(sink.items().is_empty());
    }

    struct FixedDocuments(Vec<(&'static str, &'static str)>);

    impl DirectoryMetadataProvider for FixedDocuments {
        fn directory_metadata(&self) -> Result<Vec<DirectoryMetadataEntry>> {
            self.0
                .iter()
                .map(|(dir, value)| DirectoryMetadataEntry::new(*dir, [("owner", *value)]))
                .collect()
        }
    }

    struct FixedItems(Batch);

    impl ItemSource for FixedItems {
        fn items(&self) -> Result<Batch> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_execute_with_custom_collaborators() {
        let untouched = Arc::new(Item::synthesized(Content::from("generated"), Metadata::new()));
        let items = FixedItems(vec![
            Arc::new(Item::new("team/a.md", Content::empty(), Metadata::new())),
            Arc::clone(&untouched),
        ]);
        let documents = FixedDocuments(vec![("team", "docs-team")]);
        let config = Config {
            failure_policy: FailurePolicy::Abort,
            ..Config::default()
        };
        let mut sink = CollectingSink::new();

        let summary = execute_with(
            &documents,
            &items,
            &config,
            &mut sink,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(summary.enriched, 1);

        let output = sink.into_items();
        assert_eq!(
            output[0].metadata().get_as::<String>("owner", String::new()),
            "docs-team"
        );
        assert!(Arc::ptr_eq(&output[1], &untouched));
    }
}
