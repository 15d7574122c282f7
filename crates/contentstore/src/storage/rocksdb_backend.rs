//! RocksDB backend for persistent storage.
//!
//! Records are stored as JSON under `item:{id}` keys (zero-padded so prefix
//! scans return them in id order). The id counter lives under
//! `meta:last_id` and is written in the same `WriteBatch` as the items.

use super::{subtree_records, CommitBatch, ContentBackend, ItemRecord};
use crate::error::{Result, StoreError};
use crate::item::ItemId;
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

const ITEM_PREFIX: &[u8] = b"item:";
const LAST_ID_KEY: &[u8] = b"meta:last_id";

fn item_key(id: ItemId) -> Vec<u8> {
    format!("item:{id:020}").into_bytes()
}

fn encode(record: &ItemRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| StoreError::serialization(format!("Failed to serialize item {}", record.id), Some(e)))
}

fn decode(value: &[u8]) -> Result<ItemRecord> {
    serde_json::from_slice(value)
        .map_err(|e| StoreError::serialization("Failed to deserialize item", Some(e)))
}

/// RocksDB-backed persistent storage.
///
/// Provides:
/// - Crash-safe writes with WAL
/// - Atomic batch commits
/// - Efficient prefix scans
#[derive(Clone)]
pub struct RocksDBBackend {
    db: Arc<DB>,
}

impl RocksDBBackend {
    /// Open or create a RocksDB database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        Self::open_with_options(path, opts)
    }

    /// Open a RocksDB database with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be opened.
    pub fn open_with_options<P: AsRef<Path>>(path: P, opts: Options) -> Result<Self> {
        let db = DB::open(&opts, path.as_ref()).map_err(|e| {
            StoreError::storage(
                format!("Failed to open RocksDB at {:?}", path.as_ref()),
                Some(e),
            )
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get the underlying RocksDB database handle.
    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    fn scan_items(&self) -> Result<Vec<ItemRecord>> {
        let mut records = Vec::new();

        for entry in self.db.prefix_iterator(ITEM_PREFIX) {
            let (key, value) = entry
                .map_err(|e| StoreError::storage("Failed to iterate over items", Some(e)))?;

            // The prefix iterator may run past the prefix
            if !key.starts_with(ITEM_PREFIX) {
                break;
            }

            records.push(decode(&value)?);
        }

        Ok(records)
    }
}

impl ContentBackend for RocksDBBackend {
    fn load_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let value = self
            .db
            .get(item_key(id))
            .map_err(|e| StoreError::storage(format!("Failed to load item {id}"), Some(e)))?;

        value.map(|v| decode(&v)).transpose()
    }

    fn load_all(&self, scope: Option<ItemId>) -> Result<Vec<ItemRecord>> {
        let records = self.scan_items()?;
        Ok(match scope {
            Some(root) => subtree_records(records, root),
            None => records,
        })
    }

    fn last_id(&self) -> Result<ItemId> {
        let value = self
            .db
            .get(LAST_ID_KEY)
            .map_err(|e| StoreError::storage("Failed to read id counter", Some(e)))?;

        match value {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::serialization("Failed to deserialize id counter", Some(e))),
            None => Ok(0),
        }
    }

    fn commit_batch(&mut self, batch: CommitBatch) -> Result<()> {
        let mut write = WriteBatch::default();

        for record in batch.inserted.iter().chain(&batch.updated) {
            write.put(item_key(record.id), encode(record)?);
        }
        for id in &batch.deleted {
            write.delete(item_key(*id));
        }

        let counter = serde_json::to_vec(&batch.last_id)
            .map_err(|e| StoreError::serialization("Failed to serialize id counter", Some(e)))?;
        write.put(LAST_ID_KEY, counter);

        self.db
            .write(write)
            .map_err(|e| StoreError::storage("Failed to write batch", Some(e)))
    }

    fn sync(&mut self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StoreError::storage("Failed to flush database", Some(e)))
    }
}
