//! Detail system for typed item attributes.
//!
//! A detail is a named value on an item: a primitive or a link to another
//! item. Values are generic over the link representation so the same types
//! describe in-memory items (linked by [`ItemKey`]) and stored records
//! (linked by [`ItemId`](super::ItemId)).

use super::types::ItemKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strongly-typed detail value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetailValue<L = ItemKey> {
    /// String value (text, urls, html)
    String(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Point in time
    DateTime(DateTime<Utc>),
    /// Link to another item
    Link(L),
    /// Explicit null/absence of value
    Null,
}

impl<L> DetailValue<L> {
    /// The linked item, if this value is a link.
    pub fn as_link(&self) -> Option<&L> {
        match self {
            DetailValue::Link(target) => Some(target),
            _ => None,
        }
    }

    /// Whether this is [`DetailValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, DetailValue::Null)
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            DetailValue::String(_) => "string",
            DetailValue::Int(_) => "int",
            DetailValue::Float(_) => "float",
            DetailValue::Bool(_) => "bool",
            DetailValue::DateTime(_) => "datetime",
            DetailValue::Link(_) => "link",
            DetailValue::Null => "null",
        }
    }

    /// Translate the link representation, failing if a link cannot be resolved.
    pub(crate) fn try_map_link<M, E>(
        self,
        mut resolve: impl FnMut(L) -> Result<M, E>,
    ) -> Result<DetailValue<M>, E> {
        Ok(match self {
            DetailValue::String(s) => DetailValue::String(s),
            DetailValue::Int(i) => DetailValue::Int(i),
            DetailValue::Float(f) => DetailValue::Float(f),
            DetailValue::Bool(b) => DetailValue::Bool(b),
            DetailValue::DateTime(d) => DetailValue::DateTime(d),
            DetailValue::Link(target) => DetailValue::Link(resolve(target)?),
            DetailValue::Null => DetailValue::Null,
        })
    }
}

impl<L: PartialEq> DetailValue<L> {
    /// Loose equality used by queries: floats compare within epsilon.
    pub fn matches(&self, other: &DetailValue<L>) -> bool {
        match (self, other) {
            (DetailValue::Float(a), DetailValue::Float(b)) => (a - b).abs() < f64::EPSILON,
            (a, b) => a == b,
        }
    }
}

impl<L> From<String> for DetailValue<L> {
    fn from(value: String) -> Self {
        DetailValue::String(value)
    }
}

impl<L> From<&str> for DetailValue<L> {
    fn from(value: &str) -> Self {
        DetailValue::String(value.to_string())
    }
}

impl<L> From<i64> for DetailValue<L> {
    fn from(value: i64) -> Self {
        DetailValue::Int(value)
    }
}

impl<L> From<i32> for DetailValue<L> {
    fn from(value: i32) -> Self {
        DetailValue::Int(value as i64)
    }
}

impl<L> From<f64> for DetailValue<L> {
    fn from(value: f64) -> Self {
        DetailValue::Float(value)
    }
}

impl<L> From<bool> for DetailValue<L> {
    fn from(value: bool) -> Self {
        DetailValue::Bool(value)
    }
}

impl<L> From<DateTime<Utc>> for DetailValue<L> {
    fn from(value: DateTime<Utc>) -> Self {
        DetailValue::DateTime(value)
    }
}

impl From<ItemKey> for DetailValue<ItemKey> {
    fn from(value: ItemKey) -> Self {
        DetailValue::Link(value)
    }
}

impl From<Option<ItemKey>> for DetailValue<ItemKey> {
    fn from(value: Option<ItemKey>) -> Self {
        value.map_or(DetailValue::Null, DetailValue::Link)
    }
}

/// Named single-valued details of an item.
///
/// Keys are unique and iterate in name order. Assigning [`DetailValue::Null`]
/// removes the detail, so a stored detail is never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailMap<L = ItemKey> {
    data: BTreeMap<String, DetailValue<L>>,
}

impl<L> Default for DetailMap<L> {
    fn default() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }
}

impl<L> DetailMap<L> {
    /// Create a new empty detail map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a detail and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue<L>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a detail. A null value removes it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DetailValue<L>>) {
        let key = key.into();
        match value.into() {
            DetailValue::Null => {
                self.data.remove(&key);
            }
            value => {
                self.data.insert(key, value);
            }
        }
    }

    /// Get a detail value by name.
    pub fn get(&self, key: &str) -> Option<&DetailValue<L>> {
        self.data.get(key)
    }

    /// Remove a detail by name.
    pub fn remove(&mut self, key: &str) -> Option<DetailValue<L>> {
        self.data.remove(key)
    }

    /// Check if a detail exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of details.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all details in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetailValue<L>)> {
        self.data.iter()
    }

    /// Keep only the details for which the predicate holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &DetailValue<L>) -> bool) {
        self.data.retain(|k, v| keep(k, v));
    }

    /// Type-safe getter for string details.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(DetailValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Type-safe getter for integer details.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.data.get(key) {
            Some(DetailValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Type-safe getter for float details.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.data.get(key) {
            Some(DetailValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    /// Type-safe getter for boolean details.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get(key) {
            Some(DetailValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Type-safe getter for date-time details.
    pub fn get_datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.data.get(key) {
            Some(DetailValue::DateTime(d)) => Some(*d),
            _ => None,
        }
    }

    /// Type-safe getter for link details.
    pub fn get_link(&self, key: &str) -> Option<&L> {
        self.data.get(key).and_then(DetailValue::as_link)
    }

    pub(crate) fn try_map_links<M, E>(
        self,
        mut resolve: impl FnMut(&str, L) -> Result<M, E>,
    ) -> Result<DetailMap<M>, E> {
        let mut data = BTreeMap::new();
        for (key, value) in self.data {
            let mapped = value.try_map_link(|target| resolve(&key, target))?;
            data.insert(key, mapped);
        }
        Ok(DetailMap { data })
    }
}

impl<L> FromIterator<(String, DetailValue<L>)> for DetailMap<L> {
    fn from_iter<T: IntoIterator<Item = (String, DetailValue<L>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Named, ordered, multi-valued details of an item.
pub type DetailCollections<L = ItemKey> = BTreeMap<String, Vec<DetailValue<L>>>;
