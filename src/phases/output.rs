//! Phase 3: Output
//!
//! The last phase of a dirmeta run hands the enriched batch, in input order,
//! to an [`ItemSink`]. Two sinks are provided:
//!
//! - [`CollectingSink`] keeps the items in memory, for callers embedding the
//!   pipeline.
//! - [`ReportSink`] writes one record per item (its source and fully
//!   computed metadata) as JSON lines or as a YAML sequence.

use std::io::Write;
use std::sync::Arc;

use log::warn;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::value::Value;

/// Receives the items of a batch, one at a time, in batch order.
pub trait ItemSink {
    fn accept(&mut self, item: Arc<Item>) -> Result<()>;

    /// Called once after the last item.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every item it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Vec<Arc<Item>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Arc<Item>> {
        self.items
    }
}

impl ItemSink for CollectingSink {
    fn accept(&mut self, item: Arc<Item>) -> Result<()> {
        self.items.push(item);
        Ok(())
    }
}

/// Output format of a [`ReportSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// A single YAML sequence, written when the sink finishes.
    Yaml,
}

/// One record of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub source: Option<String>,
    pub metadata: Value,
}

impl ItemReport {
    /// Build the report for `item`, computing every deferred value.
    ///
    /// Keys whose value fails to compute are left out and logged.
    pub fn from_item(item: &Item) -> Self {
        let metadata = item.metadata();
        let mut fields = Vec::with_capacity(metadata.len());
        for key in metadata.keys() {
            match metadata.get(key) {
                Ok(Some(value)) => fields.push((key.to_string(), value)),
                Ok(None) => {}
                Err(e) => warn!(
                    "Leaving '{}' out of the report for {}: {}",
                    key,
                    item.display_source(),
                    e
                ),
            }
        }
        Self {
            source: item.source().map(|p| p.display().to_string()),
            metadata: Value::Map(fields),
        }
    }
}

/// Writes an [`ItemReport`] per item to `writer`.
pub struct ReportSink<W: Write> {
    writer: W,
    format: ReportFormat,
    pending: Vec<ItemReport>,
}

impl<W: Write> ReportSink<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self {
            writer,
            format,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ItemSink for ReportSink<W> {
    fn accept(&mut self, item: Arc<Item>) -> Result<()> {
        let report = ItemReport::from_item(&item);
        match self.format {
            ReportFormat::Json => {
                let line = serde_json::to_string(&report)?;
                writeln!(self.writer, "{}", line)?;
            }
            ReportFormat::Yaml => self.pending.push(report),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.format == ReportFormat::Yaml {
            let reports = std::mem::take(&mut self.pending);
            let text = serde_yaml::to_string(&reports).map_err(|e| Error::Serialization {
                message: e.to_string(),
            })?;
            self.writer.write_all(text.as_bytes())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
