//! Backend abstractions and implementations.
//!
//! This module defines the [`ContentBackend`] trait and provides implementations:
//! - [`RocksDBBackend`]: Persistent storage (feature `rocksdb-backend`)
//! - [`MemoryBackend`]: In-memory storage for testing
//!
//! ## Design Philosophy
//!
//! - **Narrow Contract**: load by id, load a scope, commit a batch
//! - **Atomic Commits**: a batch is applied completely or not at all
//! - **Ids, Not Handles**: records link to each other by [`ItemId`]

mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDBBackend;

use crate::error::Result;
use crate::item::{DetailCollections, DetailMap, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Persisted form of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Persistent id (never transient)
    pub id: ItemId,
    /// Type tag
    pub discriminator: String,
    /// Display title
    pub title: String,
    /// Name
    pub name: String,
    /// Parent id, `None` for roots
    pub parent: Option<ItemId>,
    /// Single-valued details, links by id
    pub details: DetailMap<ItemId>,
    /// Ordered multi-valued details, links by id
    pub detail_collections: DetailCollections<ItemId>,
}

impl ItemRecord {
    /// Ids this record points at: its parent and every link target.
    pub fn referenced_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        let details = self.details.iter().filter_map(|(_, v)| v.as_link().copied());
        let collections = self
            .detail_collections
            .values()
            .flatten()
            .filter_map(|v| v.as_link().copied());
        self.parent.into_iter().chain(details).chain(collections)
    }
}

/// A set of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitBatch {
    /// Records persisted for the first time
    pub inserted: Vec<ItemRecord>,
    /// Records replacing existing ones
    pub updated: Vec<ItemRecord>,
    /// Ids to remove
    pub deleted: Vec<ItemId>,
    /// Highest id assigned so far, persisted with the batch
    pub last_id: ItemId,
}

impl CommitBatch {
    /// Whether the batch carries no item writes.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Number of item writes in the batch.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }
}

/// Trait defining the persistence contract of the content store.
///
/// All operations are explicit and return `Result` to handle failures.
pub trait ContentBackend: Send + Sync {
    /// Load one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`](crate::StoreError::Storage) if the read fails.
    /// Returns `Ok(None)` if no record has that id.
    fn load_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Load every record, or only the subtree rooted at `scope` (root included).
    ///
    /// An unknown scope id yields an empty result.
    fn load_all(&self, scope: Option<ItemId>) -> Result<Vec<ItemRecord>>;

    /// Highest id ever committed, `0` for an empty backend.
    fn last_id(&self) -> Result<ItemId>;

    /// Apply a batch atomically.
    ///
    /// Either all writes succeed or none do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`](crate::StoreError::Storage) if the batch is rejected.
    fn commit_batch(&mut self, batch: CommitBatch) -> Result<()>;

    /// Make committed writes durable (e.g. flush the WAL).
    fn sync(&mut self) -> Result<()>;
}

/// Restrict `records` to the subtree rooted at `root`, root first, breadth-first.
pub(crate) fn subtree_records(records: Vec<ItemRecord>, root: ItemId) -> Vec<ItemRecord> {
    let mut children: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();
    for record in &records {
        if let Some(parent) = record.parent {
            children.entry(parent).or_default().push(record.id);
        }
    }

    let mut by_id: BTreeMap<ItemId, ItemRecord> = records.into_iter().map(|r| (r.id, r)).collect();
    if !by_id.contains_key(&root) {
        return Vec::new();
    }

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([root]);
    let mut result = Vec::new();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(record) = by_id.remove(&current) {
            result.push(record);
        }
        if let Some(kids) = children.get(&current) {
            queue.extend(kids.iter().copied());
        }
    }

    result
}
