//! # Metadata Model
//!
//! An item's metadata is a [`Metadata`] store: an ordered, copy-on-write map
//! from string keys to [`MetadataValue`]s. A value is either plain data or a
//! [`Deferred`] computation that runs when the key is read.
//!
//! ## Deferred values
//!
//! A deferred value wraps a function `(key, view) -> Result<Value>`. The view
//! is the store the key is being read from, borrowed immutably, so a
//! computation can look at sibling keys but never change them.
//!
//! - **Uncached** deferred values run on every read. The function must be
//!   free of side effects since any number of readers may call it at once.
//! - **Cached** deferred values run once and keep the first successful
//!   result for the lifetime of that value instance (and every store that
//!   shares it). Two threads racing on the first read may both run the
//!   function; only one result is kept. Failures are not cached.
//!
//! A value handed to several items is copied with
//! [`MetadataValue::for_item`] first, so each item gets its own cache cell
//! while still sharing the function.
//!
//! Evaluation failures are returned to the caller of [`Metadata::get`]
//! rather than swallowed; deciding what to do with them is the job of
//! whoever drives the batch (see `phases::apply`).

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::value::Value;

mod store;

pub use store::Metadata;

/// Signature of a deferred metadata computation.
pub type DeferredFn = dyn Fn(&str, &Metadata) -> Result<Value> + Send + Sync;

/// A lazily computed metadata value.
pub struct Deferred {
    func: Arc<DeferredFn>,
    cache: Option<OnceLock<Value>>,
}

impl Deferred {
    /// Create a deferred value that is re-evaluated on every read.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str, &Metadata) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            cache: None,
        }
    }

    /// Create a deferred value that is evaluated once and then cached.
    pub fn cached<F>(func: F) -> Self
    where
        F: Fn(&str, &Metadata) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            cache: Some(OnceLock::new()),
        }
    }

    /// The same computation with an empty cache cell. Uncached values have
    /// no state, so they come back as `None`.
    fn with_empty_cache(&self) -> Option<Self> {
        self.cache.as_ref().map(|_| Self {
            func: Arc::clone(&self.func),
            cache: Some(OnceLock::new()),
        })
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Whether a cached value has already been computed.
    pub fn is_resolved(&self) -> bool {
        self.cache.as_ref().is_some_and(|cell| cell.get().is_some())
    }

    /// Evaluate the value for `key` against `view`.
    pub fn resolve(&self, key: &str, view: &Metadata) -> Result<Value> {
        let Some(cell) = &self.cache else {
            return (self.func)(key, view);
        };
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }
        let computed = (self.func)(key, view)?;
        // A concurrent first read may have won; keep whichever landed first.
        let _ = cell.set(computed);
        Ok(cell.get().cloned().unwrap_or(Value::Null))
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("cached", &self.is_cached())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A value slot in a [`Metadata`] store.
///
/// Cloning is a reference-count bump; the payload is shared.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    Plain(Arc<Value>),
    Deferred(Arc<Deferred>),
}

impl MetadataValue {
    /// Uncached deferred value.
    pub fn deferred<F>(func: F) -> Self
    where
        F: Fn(&str, &Metadata) -> Result<Value> + Send + Sync + 'static,
    {
        MetadataValue::Deferred(Arc::new(Deferred::new(func)))
    }

    /// Cached (compute-once) deferred value.
    pub fn cached<F>(func: F) -> Self
    where
        F: Fn(&str, &Metadata) -> Result<Value> + Send + Sync + 'static,
    {
        MetadataValue::Deferred(Arc::new(Deferred::cached(func)))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, MetadataValue::Deferred(_))
    }

    /// A copy of this slot for one item's store.
    ///
    /// Cached deferred values get a fresh cache cell, so a result computed
    /// against one item never shows up on another. Everything else is a
    /// plain clone.
    pub fn for_item(&self) -> MetadataValue {
        match self {
            MetadataValue::Deferred(d) => match d.with_empty_cache() {
                Some(fresh) => MetadataValue::Deferred(Arc::new(fresh)),
                None => self.clone(),
            },
            MetadataValue::Plain(_) => self.clone(),
        }
    }

    /// Resolve one level: plain values come back as-is, deferred values are
    /// evaluated once against `view`.
    pub fn resolve(&self, key: &str, view: &Metadata) -> Result<Value> {
        match self {
            MetadataValue::Plain(v) => Ok(Value::clone(v)),
            MetadataValue::Deferred(d) => d.resolve(key, view),
        }
    }

    /// Whether two slots share the same allocation.
    pub fn ptr_eq(&self, other: &MetadataValue) -> bool {
        match (self, other) {
            (MetadataValue::Plain(a), MetadataValue::Plain(b)) => Arc::ptr_eq(a, b),
            (MetadataValue::Deferred(a), MetadataValue::Deferred(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! impl_plain_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for MetadataValue {
                fn from(value: $ty) -> Self {
                    MetadataValue::Plain(Arc::new(value.into()))
                }
            }
        )*
    };
}

impl_plain_from!(
    Value,
    bool,
    i64,
    i32,
    u32,
    f64,
    String,
    &str,
    std::path::PathBuf,
    chrono::DateTime<chrono::FixedOffset>,
);

impl<T: Into<Value>> From<Vec<T>> for MetadataValue {
    fn from(items: Vec<T>) -> Self {
        MetadataValue::Plain(Arc::new(Value::from(items)))
    }
}

impl From<Deferred> for MetadataValue {
    fn from(deferred: Deferred) -> Self {
        MetadataValue::Deferred(Arc::new(deferred))
    }
}
