//! Pending writes buffered until the next flush.

use crate::item::ItemKey;
use std::collections::BTreeSet;
use std::fmt;

/// Counts of staged changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Transient items awaiting their first write
    pub inserts: usize,
    /// Persisted items awaiting rewrite
    pub updates: usize,
    /// Persisted items awaiting removal
    pub deletes: usize,
}

impl ChangeSummary {
    /// Total number of staged changes.
    pub fn total(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserts, {} updates, {} deletes",
            self.inserts, self.updates, self.deletes
        )
    }
}

/// What happened to an item passed to [`UnitOfWork::stage_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    /// Persisted item, removal will be committed
    Staged,
    /// Transient item, nothing to commit
    Discarded,
}

/// Staged inserts, updates and deletes, kept in handle order so that id
/// assignment and commit batches are deterministic.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnitOfWork {
    inserts: BTreeSet<ItemKey>,
    updates: BTreeSet<ItemKey>,
    deletes: BTreeSet<ItemKey>,
}

impl UnitOfWork {
    pub fn stage_insert(&mut self, item: ItemKey) {
        self.inserts.insert(item);
    }

    pub fn stage_update(&mut self, item: ItemKey) {
        self.updates.insert(item);
    }

    pub fn stage_delete(&mut self, item: ItemKey, transient: bool) -> DeleteOutcome {
        self.updates.remove(&item);
        if self.inserts.remove(&item) || transient {
            DeleteOutcome::Discarded
        } else {
            self.deletes.insert(item);
            DeleteOutcome::Staged
        }
    }

    pub fn is_staged(&self, item: ItemKey) -> bool {
        self.inserts.contains(&item) || self.updates.contains(&item)
    }

    pub fn is_deleted(&self, item: ItemKey) -> bool {
        self.deletes.contains(&item)
    }

    pub fn inserts(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.inserts.iter().copied()
    }

    pub fn updates(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.updates.iter().copied()
    }

    pub fn deletes(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.deletes.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            inserts: self.inserts.len(),
            updates: self.updates.len(),
            deletes: self.deletes.len(),
        }
    }

    pub fn clear(&mut self) {
        self.inserts.clear();
        self.updates.clear();
        self.deletes.clear();
    }
}
