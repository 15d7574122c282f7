//! Reverse link index: for each item, who links to it.
//!
//! Built on demand over a scope of items. Item links change freely between
//! saves, so the store rebuilds this index per query instead of keeping a
//! live copy.

use crate::item::{ContentItem, ItemKey};
use std::collections::{BTreeSet, HashMap};

/// Reverse-edge map over detail and collection links.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    incoming: HashMap<ItemKey, BTreeSet<ItemKey>>,
    outgoing: HashMap<ItemKey, BTreeSet<ItemKey>>,
}

impl ReferenceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every link held by `items`.
    pub fn build<'a>(items: impl IntoIterator<Item = &'a ContentItem>) -> Self {
        let mut index = Self::new();
        for item in items {
            index.insert_item(item);
        }
        index
    }

    /// Record the links held by `item`, replacing what was indexed for it.
    pub fn insert_item(&mut self, item: &ContentItem) {
        self.remove_item(item.key());

        let targets: BTreeSet<ItemKey> = item.links().map(|(_, target)| target).collect();
        for target in &targets {
            self.incoming.entry(*target).or_default().insert(item.key());
        }
        if !targets.is_empty() {
            self.outgoing.insert(item.key(), targets);
        }
    }

    /// Forget the links held by `item`. Links pointing at it stay indexed.
    pub fn remove_item(&mut self, item: ItemKey) {
        let Some(targets) = self.outgoing.remove(&item) else {
            return;
        };
        for target in targets {
            if let Some(referrers) = self.incoming.get_mut(&target) {
                referrers.remove(&item);
                if referrers.is_empty() {
                    self.incoming.remove(&target);
                }
            }
        }
    }

    /// Items linking to `target`, deduplicated, in ascending handle order.
    ///
    /// A self-linking item is its own referrer.
    pub fn referrers_of(&self, target: ItemKey) -> Vec<ItemKey> {
        self.incoming
            .get(&target)
            .map(|referrers| referrers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Items linking to any member of `targets`.
    pub fn referrers_of_any<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a ItemKey>,
    ) -> BTreeSet<ItemKey> {
        targets
            .into_iter()
            .filter_map(|target| self.incoming.get(target))
            .flatten()
            .copied()
            .collect()
    }
}
