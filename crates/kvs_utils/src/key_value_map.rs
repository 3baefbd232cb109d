use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::{HashMap, hashbrown};

// -----------------------------------------------------------------------------
// KeyValueMap

/// A flat, single-level mapping from string keys to string values.
///
/// This is the external representation that object graphs are flattened
/// into, in the spirit of web-form or query-string data. Keys are usually
/// dot- and bracket-structured, e.g. `Outer[0].Inner.Field`, but the map
/// itself attaches no meaning to them. Entry order is not significant.
///
/// The serde implementations are transparent: a `KeyValueMap` reads from and
/// writes to a plain string-to-string map in any self-describing format.
///
/// # Examples
///
/// ```
/// use kvs_utils::KeyValueMap;
///
/// let mut data = KeyValueMap::new();
/// data.insert("Name", "Craig");
/// data.insert("BirthdayYear", "1982");
///
/// assert_eq!(data.get("Name"), Some("Craig"));
/// assert!(data.contains_key("BirthdayYear"));
/// assert_eq!(data.get("BirthdayMonth"), None);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyValueMap {
    entries: HashMap<String, String>,
}

impl KeyValueMap {
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }

    /// Creates an empty map with space for at least `capacity` entries.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value stored under `key`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` if a value is stored under `key`.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` under `key`, returning the previous value if any.
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes and returns the value stored under `key`.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Moves every entry of `other` into `self`.
    ///
    /// Entries of `other` replace entries of `self` with the same key.
    pub fn append(&mut self, other: KeyValueMap) {
        if self.entries.is_empty() {
            self.entries = other.entries;
        } else {
            self.entries.extend(other.entries);
        }
    }

    /// Iterates over all `(key, value)` pairs in arbitrary order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over all keys in arbitrary order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Returns all entries sorted by key.
    pub fn to_sorted_vec(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<HashMap<String, String>> for KeyValueMap {
    #[inline]
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = KeyValueMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for KeyValueMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for KeyValueMap {
    type Item = (String, String);
    type IntoIter = hashbrown::hash_map::IntoIter<String, String>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a KeyValueMap {
    type Item = (&'a String, &'a String);
    type IntoIter = hashbrown::hash_map::Iter<'a, String, String>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// Sorted, so that two equal maps always print the same way.
impl fmt::Debug for KeyValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.to_sorted_vec()).finish()
    }
}

// -----------------------------------------------------------------------------
// Serde

impl Serialize for KeyValueMap {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyValueMap {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashMap::<String, String>::deserialize(deserializer).map(Self::from)
    }
}

// -----------------------------------------------------------------------------
// Tests
