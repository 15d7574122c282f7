//! Parent/child adjacency over indexed items.
//!
//! The index reflects the parent each item had when it was last saved or
//! loaded, not pending edits on the item itself. Membership in the index is
//! what makes an item visible to queries.

use crate::item::ItemKey;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Derived parent→children index.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    members: BTreeSet<ItemKey>,
    parents: HashMap<ItemKey, ItemKey>,
    children: HashMap<ItemKey, BTreeSet<ItemKey>>,
}

impl TreeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(item, parent)` pairs.
    pub fn rebuild(entries: impl IntoIterator<Item = (ItemKey, Option<ItemKey>)>) -> Self {
        let mut index = Self::new();
        for (item, parent) in entries {
            index.insert(item, parent);
        }
        index
    }

    /// Index `item` under `parent`, moving it if it was indexed elsewhere.
    pub fn insert(&mut self, item: ItemKey, parent: Option<ItemKey>) {
        self.detach(item);
        self.members.insert(item);
        if let Some(parent) = parent {
            self.parents.insert(item, parent);
            self.children.entry(parent).or_default().insert(item);
        }
    }

    /// Drop `item` from the index and from its parent's children.
    ///
    /// Children of `item` keep their parent entry.
    pub fn remove(&mut self, item: ItemKey) {
        self.detach(item);
        self.members.remove(&item);
    }

    fn detach(&mut self, item: ItemKey) {
        if let Some(old_parent) = self.parents.remove(&item) {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.remove(&item);
                if siblings.is_empty() {
                    self.children.remove(&old_parent);
                }
            }
        }
    }

    /// Whether `item` is indexed.
    pub fn contains(&self, item: ItemKey) -> bool {
        self.members.contains(&item)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if no item is indexed.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All indexed items in ascending handle order.
    pub fn members(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.members.iter().copied()
    }

    /// Indexed parent of `item`.
    pub fn parent_of(&self, item: ItemKey) -> Option<ItemKey> {
        self.parents.get(&item).copied()
    }

    /// Indexed children of `item` in ascending handle order.
    pub fn children_of(&self, item: ItemKey) -> Vec<ItemKey> {
        self.children
            .get(&item)
            .map(|kids| kids.iter().copied().filter(|k| self.members.contains(k)).collect())
            .unwrap_or_default()
    }

    /// Whether `item` has any indexed child.
    pub fn has_children(&self, item: ItemKey) -> bool {
        self.children
            .get(&item)
            .is_some_and(|kids| kids.iter().any(|k| self.members.contains(k)))
    }

    /// True iff walking parent links from `candidate` reaches `root`.
    ///
    /// An item counts as part of its own subtree. A `None` root stands for
    /// the whole store, so every indexed item qualifies.
    ///
    /// Runs in O(depth).
    pub fn is_descendant_of(&self, candidate: ItemKey, root: Option<ItemKey>) -> bool {
        let Some(root) = root else {
            return self.members.contains(&candidate);
        };

        let mut current = Some(candidate);
        // Bounded walk in case the index was fed a cyclic parent chain
        for _ in 0..=self.parents.len() {
            match current {
                Some(item) if item == root => return true,
                Some(item) => current = self.parent_of(item),
                None => return false,
            }
        }
        false
    }

    /// Parent chain of `item`, nearest first.
    pub fn ancestors(&self, item: ItemKey) -> Vec<ItemKey> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([item]);
        let mut current = self.parent_of(item);

        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            result.push(parent);
            current = self.parent_of(parent);
        }

        result
    }

    /// Breadth-first walk of the subtree rooted at `root`, root included.
    ///
    /// `None` returns every indexed item in handle order. An unindexed root
    /// yields nothing.
    pub fn descendants(&self, root: Option<ItemKey>) -> Vec<ItemKey> {
        let Some(root) = root else {
            return self.members.iter().copied().collect();
        };
        if !self.members.contains(&root) {
            return Vec::new();
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut result = Vec::new();

        visited.insert(root);
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            result.push(current);
            for child in self.children_of(current) {
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        result
    }
}
