//! In-memory backend for testing.
//!
//! **Note**: This backend is for testing only. All data is lost when the last
//! clone is dropped.

use super::{subtree_records, CommitBatch, ContentBackend, ItemRecord};
use crate::error::{Result, StoreError};
use crate::item::ItemId;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<ItemId, ItemRecord>,
    last_id: ItemId,
    fail_next_commit: bool,
    commits: usize,
}

/// In-memory backend using a `BTreeMap`.
///
/// Clones share the same state behind an `Arc<RwLock<>>`, so a test can keep a
/// handle to inspect what a store committed, or open a second store over the
/// same data to simulate a new session.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.records.len()).unwrap_or(0)
    }

    /// Check if the backend holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successfully applied batches.
    pub fn commit_count(&self) -> usize {
        self.read().map(|s| s.commits).unwrap_or(0)
    }

    /// Make the next [`commit_batch`](ContentBackend::commit_batch) fail
    /// without applying anything.
    pub fn fail_next_commit(&self) {
        if let Ok(mut state) = self.write() {
            state.fail_next_commit = true;
        }
    }

    /// Clear all data from the backend.
    pub fn clear(&mut self) -> Result<()> {
        let mut state = self.write()?;
        state.records.clear();
        state.last_id = 0;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StoreError::storage("Memory backend lock poisoned", None::<std::io::Error>))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StoreError::storage("Memory backend lock poisoned", None::<std::io::Error>))
    }
}

impl ContentBackend for MemoryBackend {
    fn load_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    fn load_all(&self, scope: Option<ItemId>) -> Result<Vec<ItemRecord>> {
        let records: Vec<ItemRecord> = self.read()?.records.values().cloned().collect();
        Ok(match scope {
            Some(root) => subtree_records(records, root),
            None => records,
        })
    }

    fn last_id(&self) -> Result<ItemId> {
        Ok(self.read()?.last_id)
    }

    fn commit_batch(&mut self, batch: CommitBatch) -> Result<()> {
        let mut state = self.write()?;

        if state.fail_next_commit {
            state.fail_next_commit = false;
            return Err(StoreError::storage(
                "Injected commit failure",
                None::<std::io::Error>,
            ));
        }

        // Validate everything before touching the map
        for record in &batch.inserted {
            if state.records.contains_key(&record.id) {
                return Err(StoreError::storage(
                    format!("Insert of existing item {}", record.id),
                    None::<std::io::Error>,
                ));
            }
        }
        for record in &batch.updated {
            if !state.records.contains_key(&record.id) {
                return Err(StoreError::storage(
                    format!("Update of unknown item {}", record.id),
                    None::<std::io::Error>,
                ));
            }
        }

        for record in batch.inserted.into_iter().chain(batch.updated) {
            state.records.insert(record.id, record);
        }
        for id in batch.deleted {
            state.records.remove(&id);
        }
        state.last_id = state.last_id.max(batch.last_id);
        state.commits += 1;

        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        // No-op for in-memory backend
        Ok(())
    }
}
