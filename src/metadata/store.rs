//! Ordered, copy-on-write metadata store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::MetadataValue;
use crate::error::Result;
use crate::value::{FromValue, Value};

#[derive(Default)]
struct Entries {
    /// Keys and values in first-insertion order.
    slots: Vec<(String, MetadataValue)>,
    /// Key -> position in `slots`.
    positions: HashMap<String, usize>,
}

impl Entries {
    fn insert(&mut self, key: String, value: MetadataValue) {
        match self.positions.get(&key) {
            Some(&pos) => self.slots[pos].1 = value,
            None => {
                self.positions.insert(key.clone(), self.slots.len());
                self.slots.push((key, value));
            }
        }
    }

    /// Copy of the index. Values are shared, not duplicated.
    fn shallow_copy(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            positions: self.positions.clone(),
        }
    }
}

/// An item's metadata: ordered key/value pairs with unique keys.
///
/// A store is never modified after construction. [`Metadata::with`] builds a
/// new store whose unchanged values point at the same allocations as the
/// receiver's, so deriving metadata for a transformed item costs one index
/// copy rather than a deep copy of every value.
///
/// Cloning a `Metadata` shares the whole index.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: Arc<Entries>,
}

impl Metadata {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from pairs. Later pairs replace earlier ones with the
    /// same key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        let mut entries = Entries::default();
        for (key, value) in pairs {
            entries.insert(key.into(), value.into());
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.slots.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.positions.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.slots.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order, without evaluating deferred values.
    pub fn iter_raw(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The stored slot for `key`, without evaluating it.
    pub fn get_raw(&self, key: &str) -> Option<&MetadataValue> {
        self.entries
            .positions
            .get(key)
            .map(|&pos| &self.entries.slots[pos].1)
    }

    /// Look up and resolve `key`.
    ///
    /// Returns `Ok(None)` for a missing key. An error is only possible when
    /// the key holds a deferred value whose computation fails.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.get_raw(key) {
            Some(slot) => slot.resolve(key, self).map(Some),
            None => Ok(None),
        }
    }

    /// Look up `key` and convert it to `T`.
    ///
    /// `Ok(None)` covers both a missing key and a value that does not
    /// convert. Deferred evaluation errors are passed through.
    pub fn try_get_as<T: FromValue>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get(key)?.and_then(|value| T::from_value(&value)))
    }

    /// Look up `key` and convert it to `T`, falling back to `default` on a
    /// missing key, a failed conversion or a failed evaluation.
    pub fn get_as<T: FromValue>(&self, key: &str, default: T) -> T {
        match self.try_get_as(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                debug!("Using default for metadata key '{}': {}", key, e);
                default
            }
        }
    }

    /// Return a new store with `pairs` layered over this one.
    ///
    /// Existing keys keep their position and take the new value; new keys
    /// are appended. The receiver is left untouched.
    pub fn with<I, K, V>(&self, pairs: I) -> Metadata
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        let mut entries = self.entries.shallow_copy();
        for (key, value) in pairs {
            entries.insert(key.into(), value.into());
        }
        Metadata {
            entries: Arc::new(entries),
        }
    }

    /// Return a new store without the given keys.
    pub fn without<'a, I>(&self, keys: I) -> Metadata
    where
        I: IntoIterator<Item = &'a str>,
    {
        let removed: Vec<&str> = keys.into_iter().collect();
        Metadata::from_pairs(
            self.entries
                .slots
                .iter()
                .filter(|(k, _)| !removed.iter().any(|r| *r == k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// Evaluate every entry, in insertion order.
    pub fn resolve_all(&self) -> Result<Vec<(String, Value)>> {
        self.iter_raw()
            .map(|(key, slot)| Ok((key.to_string(), slot.resolve(key, self)?)))
            .collect()
    }

    /// Evaluate every entry into a [`Value::Map`].
    pub fn to_value(&self) -> Result<Value> {
        Ok(Value::Map(self.resolve_all()?))
    }

    /// Whether `key` refers to the same stored value in both stores.
    pub fn shares_value(&self, other: &Metadata, key: &str) -> bool {
        match (self.get_raw(key), other.get_raw(key)) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.slots.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Metadata::from_pairs(iter)
    }
}
