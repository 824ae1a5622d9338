//! Aggregate result of a successful run.

use std::collections::HashMap;
use std::iter::Map;
use std::mem;
use std::slice;
use std::vec;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::TaskKey;

/// Resolved value of every task in a run, in the order the tasks were given.
///
/// Keys are unique; lookups accept anything that borrows as `str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMap<V> {
    entries: Vec<(TaskKey, V)>,
}

impl<V> ValueMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value, replacing (in place) any value already stored under `key`.
    pub fn insert(&mut self, key: impl Into<TaskKey>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    #[must_use]
    pub fn into_hash_map(self) -> HashMap<TaskKey, V> {
        self.entries.into_iter().collect()
    }
}

impl<V> Default for ValueMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<TaskKey>, V> FromIterator<(K, V)> for ValueMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V> IntoIterator for ValueMap<V> {
    type Item = (TaskKey, V);
    type IntoIter = vec::IntoIter<(TaskKey, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a ValueMap<V> {
    type Item = (&'a TaskKey, &'a V);
    type IntoIter =
        Map<slice::Iter<'a, (TaskKey, V)>, fn(&'a (TaskKey, V)) -> (&'a TaskKey, &'a V)>;

    fn into_iter(self) -> Self::IntoIter {
        let split: fn(&'a (TaskKey, V)) -> (&'a TaskKey, &'a V) = |(key, value)| (key, value);
        self.entries.iter().map(split)
    }
}

impl<V: Serialize> Serialize for ValueMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
