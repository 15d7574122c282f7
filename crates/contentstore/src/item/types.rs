//! Core item types: handles, ids and the content item itself.

use super::detail::{DetailCollections, DetailMap, DetailValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistent identity of an item, assigned by the store on first flush.
///
/// [`TRANSIENT_ID`] marks an item that has never been persisted.
pub type ItemId = u64;

/// Id carried by items that have not been persisted yet.
pub const TRANSIENT_ID: ItemId = 0;

/// Opaque in-session handle of an item held by a store.
///
/// Handles are stable for the lifetime of the store that issued them and are
/// never persisted. Links between items and parent pointers are handles, so
/// transient items can be linked before they have an [`ItemId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(u64);

impl ItemKey {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The unit of storage: a node in the content tree carrying typed details.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    key: ItemKey,
    id: ItemId,
    discriminator: String,
    parent: Option<ItemKey>,
    /// Display title
    pub title: String,
    /// Name (url segment)
    pub name: String,
    /// Single-valued details
    pub details: DetailMap,
    /// Ordered multi-valued details
    pub detail_collections: DetailCollections,
}

impl ContentItem {
    pub(crate) fn new(key: ItemKey, discriminator: String, name: String) -> Self {
        Self {
            key,
            id: TRANSIENT_ID,
            discriminator,
            parent: None,
            title: name.clone(),
            name,
            details: DetailMap::new(),
            detail_collections: DetailCollections::new(),
        }
    }

    pub(crate) fn restore(
        key: ItemKey,
        id: ItemId,
        discriminator: String,
        parent: Option<ItemKey>,
    ) -> Self {
        Self {
            key,
            id,
            discriminator,
            parent,
            title: String::new(),
            name: String::new(),
            details: DetailMap::new(),
            detail_collections: DetailCollections::new(),
        }
    }

    /// In-session handle.
    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// Persistent id, or [`TRANSIENT_ID`] before the first flush.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Whether the item has never been persisted.
    pub fn is_transient(&self) -> bool {
        self.id == TRANSIENT_ID
    }

    /// Type tag fixed at construction.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Parent handle, `None` for roots.
    ///
    /// Parents are changed through [`ContentStore::set_parent`](crate::ContentStore::set_parent),
    /// which rejects cycles.
    pub fn parent(&self) -> Option<ItemKey> {
        self.parent
    }

    pub(crate) fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    pub(crate) fn set_parent_unchecked(&mut self, parent: Option<ItemKey>) {
        self.parent = parent;
    }

    /// Get a detail value by name.
    pub fn detail(&self, name: &str) -> Option<&DetailValue> {
        self.details.get(name)
    }

    /// Set a detail. Assigning null (or `None` for links) clears it.
    pub fn set_detail(&mut self, name: impl Into<String>, value: impl Into<DetailValue>) {
        self.details.insert(name, value);
    }

    /// Get a detail collection by name.
    pub fn collection(&self, name: &str) -> Option<&[DetailValue]> {
        self.detail_collections.get(name).map(Vec::as_slice)
    }

    /// Get a detail collection for modification, creating it when missing.
    pub fn collection_mut(&mut self, name: impl Into<String>) -> &mut Vec<DetailValue> {
        self.detail_collections.entry(name.into()).or_default()
    }

    /// Every outgoing link with the slot holding it, details first.
    ///
    /// A target linked from several slots is yielded once per slot.
    pub fn links(&self) -> impl Iterator<Item = (&str, ItemKey)> + '_ {
        let details = self
            .details
            .iter()
            .filter_map(|(name, value)| value.as_link().map(|t| (name.as_str(), *t)));
        let collections = self.detail_collections.iter().flat_map(|(name, values)| {
            values
                .iter()
                .filter_map(move |value| value.as_link().map(|t| (name.as_str(), *t)))
        });
        details.chain(collections)
    }

    /// Clear every link whose target satisfies `severed`.
    ///
    /// Link details are removed and matching collection entries are dropped,
    /// keeping the order of the remaining entries. Returns the number of
    /// slots cleared.
    pub fn clear_links(&mut self, mut severed: impl FnMut(ItemKey) -> bool) -> usize {
        let mut cleared = 0;

        self.details.retain(|_, value| match value.as_link() {
            Some(target) if severed(*target) => {
                cleared += 1;
                false
            }
            _ => true,
        });

        for values in self.detail_collections.values_mut() {
            let before = values.len();
            values.retain(|value| !matches!(value.as_link(), Some(target) if severed(*target)));
            cleared += before - values.len();
        }

        cleared
    }
}
