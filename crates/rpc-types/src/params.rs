//! # Parameter Store
//!
//! Ordered, string-keyed map backing one message.
//!
//! ## Absent vs null vs empty
//!
//! - Absent: the key is not present; [`ParamStore::get`] returns `None`.
//! - Null: the key is present with [`Value::Null`].
//! - Empty: the key is present with an empty string, list or store.
//!
//! Setting a key to `None` removes it; it never stores a null.

use crate::codec::FieldCodec;
use crate::errors::ValidationError;
use crate::facade::decode_list;
use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered map of named parameter values.
///
/// Keys are unique. Overwriting a key keeps its original position so that
/// re-encoding a decoded message preserves field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamStore {
    entries: Vec<(String, Value)>,
}

impl ParamStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Get the raw value for a key, `None` if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Insert or remove a key.
    ///
    /// `Some(value)` inserts or overwrites, `None` removes the key entirely.
    /// Returns the previous value, if any.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Option<Value>>,
    ) -> Option<Value> {
        let key = key.into();
        match value.into() {
            Some(value) => self.insert(key, value),
            None => self.remove(&key),
        }
    }

    /// Insert or overwrite a key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Decode a key into a typed value.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` - the key is absent
    /// - `Ok(Some(value))` - the key decoded
    /// - `Err(_)` - the key is present but malformed; the error names the key
    pub fn get_typed<T: FieldCodec>(&self, key: &str) -> Result<Option<T>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => T::decode(value)
                .map(Some)
                .map_err(|e| e.in_field(key)),
        }
    }

    /// Decode a key holding a list into typed elements.
    ///
    /// Nested stores coerce into structs element by element. An empty list,
    /// a null element, a list mixing typed structs with untyped stores, or any
    /// element failing to decode is an error naming the key.
    pub fn get_typed_list<T: FieldCodec>(
        &self,
        key: &str,
    ) -> Result<Option<Vec<T>>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => decode_list(value).map(Some).map_err(|e| e.in_field(key)),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParamStore {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut store = ParamStore::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

impl IntoIterator for ParamStore {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParamStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

/// Builds a store from a map, keeping wire order. Later duplicates win.
pub(crate) struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = ParamStore;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of named parameters")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ParamStore, A::Error> {
        let mut store = ParamStore::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            store.insert(key, value);
        }
        Ok(store)
    }
}
