//! Route parameters.
//!
//! A route entry's parameters are a closed variant: either absent
//! (`Option::None` on the entry) or a [`RouteParams`] mapping from string keys
//! to a [`ParamValue`], which is a single string or, when a query key repeats
//! or a catch-all segment binds several segments, an ordered array of strings.
//!
//! [`RouteParams`] keeps insertion order so snapshots serialize the same way
//! every time, while equality ignores order.
//!
//! # Example
//!
//! ```
//! use navstate::{ParamValue, RouteParams};
//!
//! let mut params = RouteParams::new();
//! params.append("tag", "rust");
//! params.append("tag", "nav");
//! params.insert("page", "2");
//!
//! assert_eq!(params.get_as::<u32>("page"), Some(2));
//! assert_eq!(
//!     params.get("tag"),
//!     Some(&ParamValue::Multiple(vec!["rust".into(), "nav".into()]))
//! );
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// One string value.
    Single(String),
    /// Several values, in encounter order.
    Multiple(Vec<String>),
}

impl ParamValue {
    /// Get the value as a string, if it is a single value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    /// Get the first value, whatever the variant.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }

    /// Iterate over every value.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// Add another value, turning a single value into an array.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

/// Insertion-ordered parameter mapping.
#[derive(Debug, Clone, Default)]
pub struct RouteParams {
    entries: Vec<(String, ParamValue)>,
}

impl RouteParams {
    /// Create empty route parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from `(key, value)` string pairs. Later duplicates
    /// overwrite earlier ones.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }

    /// Get a parameter value by key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Get a single-valued parameter as `&str`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist, is an array, or cannot
    /// be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get_str(key)?.parse().ok()
    }

    /// Insert or overwrite a parameter. An overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Append a value, collapsing repeated keys into an array in encounter order.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1.push(value);
        } else {
            self.entries.push((key, ParamValue::Single(value)));
        }
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let position = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over all `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when every key of `subset` is present here with an equal value.
    ///
    /// An empty `subset` is contained in anything.
    pub fn contains_all(&self, subset: &RouteParams) -> bool {
        subset
            .iter()
            .all(|(key, value)| self.get(key) == Some(value))
    }

    /// Merge parent parameters with child parameters
    ///
    /// Child parameters override parent parameters in case of collision.
    ///
    /// # Example
    ///
    /// ```
    /// use navstate::RouteParams;
    ///
    /// let query = RouteParams::from_pairs([("id", "from-query"), ("sort", "asc")]);
    /// let path = RouteParams::from_pairs([("id", "42")]);
    ///
    /// let merged = RouteParams::merge(&query, &path);
    /// assert_eq!(merged.get_str("id"), Some("42"));
    /// assert_eq!(merged.get_str("sort"), Some("asc"));
    /// ```
    pub fn merge(parent: &RouteParams, child: &RouteParams) -> RouteParams {
        let mut merged = parent.clone();

        for (key, value) in child.iter() {
            merged.insert(key, value.clone());
        }

        merged
    }
}

impl PartialEq for RouteParams {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.contains_all(other)
    }
}

impl Eq for RouteParams {}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RouteParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = RouteParams;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strings or string arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut params = RouteParams::new();
                while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
                    params.insert(key, value);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================
