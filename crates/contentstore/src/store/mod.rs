//! Main ContentStore interface: identity map, unit of work and queries.

mod options;
mod records;
mod unit_of_work;

pub use options::StoreOptions;
pub use unit_of_work::ChangeSummary;

use crate::discriminators::{self, DiscriminatorCount};
use crate::error::{Result, StoreError};
use crate::export::{check_export_size, DotOptions};
use crate::index::{ReferenceIndex, TreeIndex};
use crate::item::{ContentItem, ItemId, ItemKey, TRANSIENT_ID};
use crate::query::{Parameter, QueryBuilder};
use crate::storage::{CommitBatch, ContentBackend, ItemRecord};
use log::{debug, info, trace, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
#[cfg(feature = "rocksdb-backend")]
use std::path::Path;
use unit_of_work::{DeleteOutcome, UnitOfWork};

/// The content repository.
///
/// `ContentStore` holds every loaded item in an arena addressed by
/// [`ItemKey`], maps persistent ids to handles, and buffers writes in a unit
/// of work until [`flush`](Self::flush). Items become visible to queries once
/// they are saved or loaded.
///
/// # Examples
///
/// ```
/// use contentstore::{ContentStore, DiscriminatorCount};
///
/// # fn example() -> contentstore::Result<()> {
/// let mut store = ContentStore::in_memory()?;
/// let root = store.create("Page", "root", None)?;
/// let part = store.create("Part", "intro", Some(root))?;
/// store.item_mut(part)?.set_detail("Text", "Hello");
///
/// store.save(&[root])?;
/// store.flush()?;
///
/// assert_eq!(
///     store.find_descendant_discriminators(Some(root))?,
///     vec![DiscriminatorCount::new("Page", 1), DiscriminatorCount::new("Part", 1)]
/// );
/// # Ok(())
/// # }
/// ```
pub struct ContentStore {
    backend: Box<dyn ContentBackend>,
    options: StoreOptions,
    // Arena of loaded and created items
    items: BTreeMap<ItemKey, ContentItem>,
    // Identity map: every persisted item is loaded at most once
    identity: HashMap<ItemId, ItemKey>,
    tree: TreeIndex,
    pending: UnitOfWork,
    next_key: u64,
    last_id: ItemId,
    // Backend scopes already materialized
    fully_loaded: bool,
    loaded_scopes: HashSet<ItemId>,
}

impl ContentStore {
    /// Open a store over the given backend with default options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend cannot be read.
    pub fn with_backend(backend: Box<dyn ContentBackend>) -> Result<Self> {
        Self::with_options(backend, StoreOptions::default())
    }

    /// Open a store over the given backend.
    ///
    /// With [`StoreOptions::eager_load`] every record is loaded up front;
    /// otherwise items are loaded on first access.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend cannot be read.
    pub fn with_options(backend: Box<dyn ContentBackend>, options: StoreOptions) -> Result<Self> {
        let last_id = backend.last_id()?;
        let mut store = Self {
            backend,
            options,
            items: BTreeMap::new(),
            identity: HashMap::new(),
            tree: TreeIndex::new(),
            pending: UnitOfWork::default(),
            next_key: 1,
            last_id,
            fully_loaded: false,
            loaded_scopes: HashSet::new(),
        };

        if store.options.eager_load {
            store.ensure_loaded(None)?;
        }

        debug!(
            "Store ready: last_id={last_id}, {} items loaded",
            store.items.len()
        );
        Ok(store)
    }

    /// Open a persistent store at the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use contentstore::ContentStore;
    ///
    /// let store = ContentStore::open("./site.content").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be opened.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        use crate::storage::RocksDBBackend;
        info!("Opening content store at path: {:?}", path.as_ref());
        let backend = RocksDBBackend::open(path)?;
        Self::with_backend(Box::new(backend))
    }

    /// Create an in-memory store.
    ///
    /// **Warning**: All data is lost when the store is dropped.
    pub fn in_memory() -> Result<Self> {
        use crate::storage::MemoryBackend;
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Options the store was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // ========================================
    // Item Operations
    // ========================================

    /// Create a transient item.
    ///
    /// The item is not visible to queries and has no id until it is saved
    /// and flushed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if `parent` is not in the store.
    pub fn create(
        &mut self,
        discriminator: impl Into<String>,
        name: impl Into<String>,
        parent: Option<ItemKey>,
    ) -> Result<ItemKey> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }

        let key = self.allocate_key();
        let mut item = ContentItem::new(key, discriminator.into(), name.into());
        item.set_parent_unchecked(parent);
        trace!("Created item {key}: discriminator={}", item.discriminator());
        self.items.insert(key, item);

        Ok(key)
    }

    /// Get an item by handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the handle is unknown or the
    /// item is staged for deletion.
    pub fn item(&self, key: ItemKey) -> Result<&ContentItem> {
        self.require(key)
    }

    /// Get a mutable reference to an item by handle.
    ///
    /// Changes become durable once the item is saved and flushed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the handle is unknown or the
    /// item is staged for deletion.
    pub fn item_mut(&mut self, key: ItemKey) -> Result<&mut ContentItem> {
        if self.pending.is_deleted(key) {
            return Err(StoreError::not_found(key));
        }
        self.items
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found(key))
    }

    /// Handle of a loaded item by persistent id.
    pub fn key_of(&self, id: ItemId) -> Option<ItemKey> {
        self.identity.get(&id).copied()
    }

    /// Move an item under a new parent, or make it a root with `None`.
    ///
    /// The move reaches the tree index when the item is saved.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if either handle is unknown
    /// - [`StoreError::CycleInTree`] if `parent` is the item or one of its
    ///   descendants
    pub fn set_parent(&mut self, key: ItemKey, parent: Option<ItemKey>) -> Result<()> {
        self.require(key)?;
        if let Some(parent) = parent {
            self.require(parent)?;
            self.check_cycle(key, parent)?;
        }

        debug!("Moving item {key} under {parent:?}");
        self.item_mut(key)?.set_parent_unchecked(parent);
        Ok(())
    }

    /// Walk the current parent chain of `parent` looking for `key`.
    fn check_cycle(&self, key: ItemKey, parent: ItemKey) -> Result<()> {
        self.walk_for_cycle(key, parent, |ancestor| {
            self.items.get(&ancestor).and_then(ContentItem::parent)
        })
    }

    /// Reject staging `staged` when the tree index it would produce has a
    /// loop: staged items take their current parent, every other item keeps
    /// its indexed one.
    fn check_staged_tree(&self, staged: &[ItemKey]) -> Result<()> {
        let staged_set: HashSet<ItemKey> = staged.iter().copied().collect();
        let parent_after = |ancestor: ItemKey| {
            if staged_set.contains(&ancestor) {
                self.items.get(&ancestor).and_then(ContentItem::parent)
            } else {
                self.tree.parent_of(ancestor)
            }
        };

        for &key in staged {
            if let Some(parent) = self.items.get(&key).and_then(ContentItem::parent) {
                self.walk_for_cycle(key, parent, &parent_after)?;
            }
        }
        Ok(())
    }

    fn walk_for_cycle(
        &self,
        key: ItemKey,
        parent: ItemKey,
        parent_of: impl Fn(ItemKey) -> Option<ItemKey>,
    ) -> Result<()> {
        let mut current = Some(parent);
        for _ in 0..=self.items.len() {
            match current {
                Some(ancestor) if ancestor == key => {
                    return Err(StoreError::CycleInTree {
                        item: key.to_string(),
                        parent: parent.to_string(),
                    });
                }
                Some(ancestor) => current = parent_of(ancestor),
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Stage items for writing.
    ///
    /// Transient items are staged as inserts and persisted items as updates.
    /// Transient items reachable from a saved item through its parent, its
    /// children or its links are staged along with it. Saving an item again
    /// is harmless.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if an item, or the parent of a staged
    ///   item, is unknown or staged for deletion
    /// - [`StoreError::CycleInTree`] if the staged parents would close a loop
    ///   with the saved tree
    ///
    /// Nothing is staged in either case.
    pub fn save(&mut self, keys: &[ItemKey]) -> Result<()> {
        for key in keys {
            self.require(*key)?;
        }

        let closure = self.save_closure(keys);
        for key in &closure {
            if let Some(parent) = self.require(*key)?.parent() {
                self.require(parent)?;
            }
        }
        self.check_staged_tree(&closure)?;

        for key in closure {
            self.stage(key);
        }
        Ok(())
    }

    /// Items staged by saving `roots`, in handle order.
    fn save_closure(&self, roots: &[ItemKey]) -> Vec<ItemKey> {
        let mut transient_children: HashMap<ItemKey, Vec<ItemKey>> = HashMap::new();
        for item in self.items.values().filter(|item| item.is_transient()) {
            if let Some(parent) = item.parent() {
                transient_children.entry(parent).or_default().push(item.key());
            }
        }

        let mut seen: BTreeSet<ItemKey> = roots.iter().copied().collect();
        let mut queue: VecDeque<ItemKey> = roots.iter().copied().collect();

        while let Some(key) = queue.pop_front() {
            let Some(item) = self.items.get(&key) else {
                continue;
            };

            let linked = item.links().map(|(_, target)| target).chain(item.parent());
            let children = transient_children.get(&key).into_iter().flatten().copied();

            for next in linked.chain(children) {
                let cascade = !self.pending.is_deleted(next)
                    && self.items.get(&next).is_some_and(ContentItem::is_transient);
                if cascade && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        seen.into_iter().collect()
    }

    fn stage(&mut self, key: ItemKey) {
        let Some(item) = self.items.get(&key) else {
            return;
        };

        let parent = item.parent();
        if item.is_transient() {
            self.pending.stage_insert(key);
            debug!("Staged insert of {key}");
        } else {
            self.pending.stage_update(key);
            debug!("Staged update of {key} (id={})", item.id());
        }
        self.tree.insert(key, parent);
    }

    /// Stage an item for deletion.
    ///
    /// The item leaves the tree index at once. A transient item is simply
    /// discarded. Links pointing at the item are left in place; call
    /// [`remove_references_to_recursive`](Self::remove_references_to_recursive)
    /// first to sever them.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if the handle is unknown
    /// - [`StoreError::InvalidOperation`] if the item still has children
    ///   (see [`delete_recursive`](Self::delete_recursive))
    pub fn delete(&mut self, key: ItemKey) -> Result<()> {
        self.require(key)?;
        self.ensure_loaded(Some(key))?;

        if self.tree.has_children(key) {
            return Err(StoreError::InvalidOperation {
                message: format!("Item {key} still has children"),
            });
        }

        self.stage_delete(key);
        Ok(())
    }

    /// Stage an item and its whole subtree for deletion.
    ///
    /// Returns the number of items removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the handle is unknown.
    pub fn delete_recursive(&mut self, key: ItemKey) -> Result<usize> {
        self.require(key)?;
        self.ensure_loaded(Some(key))?;

        let mut subtree = self.tree.descendants(Some(key));
        if subtree.is_empty() {
            subtree.push(key);
        }

        // Leaves first
        for item in subtree.iter().rev() {
            self.stage_delete(*item);
        }
        Ok(subtree.len())
    }

    fn stage_delete(&mut self, key: ItemKey) {
        let transient = self.items.get(&key).is_some_and(ContentItem::is_transient);
        self.tree.remove(key);

        match self.pending.stage_delete(key, transient) {
            DeleteOutcome::Staged => debug!("Staged delete of {key}"),
            DeleteOutcome::Discarded => {
                self.items.remove(&key);
                debug!("Discarded transient item {key}");
            }
        }
    }

    /// Commit every staged change to the backend as one batch.
    ///
    /// On success transient items receive ids and deleted items leave the
    /// store. On failure nothing is applied: no id is published and the
    /// staged changes are kept so the flush can be retried.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DanglingReference`] if a staged item links to (or is
    ///   parented by) an item that is neither persisted nor staged
    /// - [`StoreError::CommitFailed`] if the backend rejects the batch
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            trace!("Nothing to flush");
            return Ok(());
        }

        let summary = self.pending.summary();
        debug!("Flushing {summary}");

        let assigned: BTreeMap<ItemKey, ItemId> =
            self.pending.inserts().zip(self.last_id + 1..).collect();
        let last_id = self.last_id + assigned.len() as ItemId;

        let batch = self.build_batch(&assigned, last_id)?;
        self.backend
            .commit_batch(batch)
            .map_err(|e| StoreError::commit_failed(format!("Failed to commit {summary}"), e))?;

        for (key, id) in &assigned {
            if let Some(item) = self.items.get_mut(key) {
                item.set_id(*id);
            }
            self.identity.insert(*id, *key);
        }

        let deleted: Vec<ItemKey> = self.pending.deletes().collect();
        for key in deleted {
            if let Some(item) = self.items.remove(&key) {
                self.identity.remove(&item.id());
                self.loaded_scopes.remove(&item.id());
            }
        }

        self.last_id = last_id;
        self.pending.clear();

        if self.options.sync_on_flush {
            self.backend.sync()?;
        }

        info!("Flushed {summary}; last id is now {last_id}");
        Ok(())
    }

    fn build_batch(
        &self,
        assigned: &BTreeMap<ItemKey, ItemId>,
        last_id: ItemId,
    ) -> Result<CommitBatch> {
        let resolve = |key: ItemKey| -> Option<ItemId> {
            if let Some(id) = assigned.get(&key) {
                return Some(*id);
            }
            if self.pending.is_deleted(key) {
                return None;
            }
            self.items
                .get(&key)
                .map(ContentItem::id)
                .filter(|id| *id != TRANSIENT_ID)
        };

        let mut batch = CommitBatch {
            last_id,
            ..CommitBatch::default()
        };

        for (key, id) in assigned {
            let item = self.items.get(key).ok_or_else(|| StoreError::not_found(key))?;
            batch.inserted.push(records::to_record(item, *id, &resolve)?);
        }

        for key in self.pending.updates() {
            let item = self.items.get(&key).ok_or_else(|| StoreError::not_found(key))?;
            batch.updated.push(records::to_record(item, item.id(), &resolve)?);
        }

        batch.deleted = self
            .pending
            .deletes()
            .filter_map(|key| self.items.get(&key))
            .map(ContentItem::id)
            .filter(|id| *id != TRANSIENT_ID)
            .collect();

        trace!("Built commit batch with {} writes", batch.len());
        Ok(batch)
    }

    /// Summary of the changes staged since the last flush.
    pub fn pending_changes(&self) -> ChangeSummary {
        self.pending.summary()
    }

    // ========================================
    // Loading
    // ========================================

    /// Get an item by persistent id, loading it from the backend if needed.
    ///
    /// Returns `None` for the transient id, for ids the backend does not
    /// know, and for items staged for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend read fails.
    pub fn get(&mut self, id: ItemId) -> Result<Option<&ContentItem>> {
        if id == TRANSIENT_ID {
            return Ok(None);
        }

        if !self.identity.contains_key(&id) {
            let Some(record) = self.backend.load_by_id(id)? else {
                trace!("No item with id {id}");
                return Ok(None);
            };
            self.materialize(vec![record])?;
        }

        let Some(key) = self.key_of(id) else {
            return Ok(None);
        };
        if self.pending.is_deleted(key) {
            return Ok(None);
        }
        Ok(self.items.get(&key))
    }

    /// Load the whole backend, or the subtree of a persisted item.
    fn ensure_loaded(&mut self, scope: Option<ItemKey>) -> Result<()> {
        if self.fully_loaded {
            return Ok(());
        }

        match scope {
            None => {
                let records = self.backend.load_all(None)?;
                self.materialize(records)?;
                self.fully_loaded = true;
            }
            Some(key) => {
                let id = self.require(key)?.id();
                if id == TRANSIENT_ID || self.loaded_scopes.contains(&id) {
                    return Ok(());
                }
                let records = self.backend.load_all(Some(id))?;
                self.materialize(records)?;
                self.loaded_scopes.insert(id);
            }
        }
        Ok(())
    }

    /// Load the scope of a query. A `Some` root must be visible.
    fn load_scope(&mut self, root: Option<ItemKey>) -> Result<()> {
        if let Some(root) = root {
            self.require(root)?;
            if !self.tree.contains(root) {
                return Err(StoreError::not_found(root));
            }
        }
        self.ensure_loaded(root)
    }

    /// Bring records into the arena.
    ///
    /// Records already in the identity map are skipped so in-memory edits
    /// survive. Parents and link targets of new records are loaded too, so
    /// every link of a loaded item resolves to a handle. Nothing is added
    /// to the store if a backend read fails.
    fn materialize(&mut self, loaded: Vec<ItemRecord>) -> Result<()> {
        let mut allocated: HashMap<ItemId, ItemKey> = HashMap::new();
        let mut queued: HashSet<ItemId> = loaded.iter().map(|r| r.id).collect();
        let mut missing: HashSet<ItemId> = HashSet::new();
        let mut queue: VecDeque<ItemRecord> = loaded.into();
        let mut fresh = Vec::new();

        while let Some(record) = queue.pop_front() {
            if self.identity.contains_key(&record.id) || allocated.contains_key(&record.id) {
                continue;
            }
            allocated.insert(record.id, self.allocate_key());

            let referenced: Vec<ItemId> = record.referenced_ids().collect();
            for id in referenced {
                if self.identity.contains_key(&id)
                    || queued.contains(&id)
                    || missing.contains(&id)
                {
                    continue;
                }
                match self.backend.load_by_id(id)? {
                    Some(target) => {
                        queued.insert(id);
                        queue.push_back(target);
                    }
                    None => {
                        warn!("Item {} references missing item {id}", record.id);
                        missing.insert(id);
                    }
                }
            }
            fresh.push(record);
        }

        self.identity.extend(allocated.iter().map(|(id, key)| (*id, *key)));

        let count = fresh.len();
        for record in fresh {
            let Some(key) = allocated.get(&record.id).copied() else {
                continue;
            };
            let item = records::from_record(key, record, |id| self.identity.get(&id).copied());
            self.tree.insert(key, item.parent());
            self.items.insert(key, item);
        }

        if count > 0 {
            debug!("Loaded {count} items from the backend");
        }
        Ok(())
    }

    // ========================================
    // Queries
    // ========================================

    /// Create a query builder over the visible items.
    ///
    /// The builder only sees items already loaded; see the `find*` methods
    /// for queries that load their scope first.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Items matching every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] for an empty parameter list or a
    /// malformed parameter.
    pub fn find(&mut self, parameters: &[Parameter]) -> Result<Vec<ItemKey>> {
        if parameters.is_empty() {
            return Err(StoreError::invalid_query("At least one parameter is required"));
        }
        self.ensure_loaded(None)?;

        let mut query = self.query();
        for parameter in parameters {
            query = parameter.apply(query)?;
        }
        query.execute()
    }

    /// Items of the given discriminator in the subtree of `root` (root
    /// included), or in the whole store when `root` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if `root` is not visible.
    pub fn find_descendants(
        &mut self,
        root: Option<ItemKey>,
        discriminator: &str,
    ) -> Result<Vec<ItemKey>> {
        self.load_scope(root)?;

        let mut query = self.query().discriminator(discriminator);
        if let Some(root) = root {
            query = query.below(root);
        }
        query.execute()
    }

    /// Item counts per discriminator in the subtree of `root` (root
    /// included), or in the whole store when `root` is `None`.
    ///
    /// Sorted by count descending, then by discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if `root` is not visible.
    pub fn find_descendant_discriminators(
        &mut self,
        root: Option<ItemKey>,
    ) -> Result<Vec<DiscriminatorCount>> {
        self.load_scope(root)?;

        let scope = self.tree.descendants(root);
        Ok(discriminators::aggregate(
            scope.iter().filter_map(|key| self.items.get(key)),
        ))
    }

    /// Items anywhere in the store linking to `target`, in handle order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if `target` is unknown.
    pub fn find_referencing(&mut self, target: ItemKey) -> Result<Vec<ItemKey>> {
        self.require(target)?;
        self.ensure_loaded(None)?;

        let index = ReferenceIndex::build(self.visible_items());
        Ok(index.referrers_of(target))
    }

    /// Sever every link into the subtree of `root`, root included.
    ///
    /// Links held by items inside the subtree are severed too. Single-valued
    /// details are cleared and collection entries removed; every changed
    /// item is staged for update. Returns the number of link slots cleared.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if `root` is unknown
    /// - [`StoreError::CycleInTree`] if a referrer was moved under its own
    ///   subtree without being saved; no link is cleared in that case
    pub fn remove_references_to_recursive(&mut self, root: ItemKey) -> Result<usize> {
        self.require(root)?;
        self.ensure_loaded(None)?;

        let mut protected: HashSet<ItemKey> =
            self.tree.descendants(Some(root)).into_iter().collect();
        protected.insert(root);

        let referrers: Vec<_> = ReferenceIndex::build(self.visible_items())
            .referrers_of_any(&protected)
            .into_iter()
            .collect();
        self.check_staged_tree(&referrers)?;

        let mut cleared = 0;
        let mut touched = Vec::new();
        for key in referrers {
            let Some(item) = self.items.get_mut(&key) else {
                continue;
            };
            let slots = item.clear_links(|target| protected.contains(&target));
            if slots > 0 {
                trace!("Cleared {slots} links held by {key}");
                cleared += slots;
                touched.push(key);
            }
        }

        for key in touched {
            self.stage(key);
        }

        debug!("Removed {cleared} references into the subtree of {root}");
        Ok(cleared)
    }

    // ========================================
    // Tree Navigation
    // ========================================

    /// Visible children of an item, in handle order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the handle is unknown.
    pub fn children_of(&mut self, key: ItemKey) -> Result<Vec<ItemKey>> {
        self.require(key)?;
        self.ensure_loaded(Some(key))?;
        Ok(self.tree.children_of(key))
    }

    /// True iff `candidate` is `root` or lies below it. Every visible item
    /// qualifies when `root` is `None`.
    pub fn is_descendant_of(&self, candidate: ItemKey, root: Option<ItemKey>) -> bool {
        self.tree.is_descendant_of(candidate, root)
    }

    /// Parent chain of an item, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the handle is unknown.
    pub fn ancestors(&self, key: ItemKey) -> Result<Vec<ItemKey>> {
        self.require(key)?;
        Ok(self.tree.ancestors(key))
    }

    /// Recompute the tree index from the current parent of every visible
    /// item.
    pub fn rebuild_tree_index(&mut self) {
        let entries: Vec<_> = self
            .tree
            .members()
            .filter_map(|key| self.items.get(&key))
            .map(|item| (item.key(), item.parent()))
            .collect();
        self.tree = TreeIndex::rebuild(entries);
        debug!("Rebuilt tree index with {} items", self.tree.len());
    }

    /// Load the subtree of `root`, or the whole backend when `root` is
    /// `None`, so that [`query`](Self::query) sees it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if `root` is not visible.
    pub fn load_subtree(&mut self, root: Option<ItemKey>) -> Result<()> {
        self.load_scope(root)
    }

    // ========================================
    // Export
    // ========================================

    /// Export the subtree of `root` (or the whole store) to JSON.
    ///
    /// **Warning**: Scopes over 10K items produce a warning; scopes over
    /// 100K items fail.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if `root` is not visible
    /// - [`StoreError::InvalidOperation`] if the scope is too large
    pub fn export_json(&mut self, root: Option<ItemKey>) -> Result<String> {
        let scope = self.export_scope(root)?;
        crate::export::export_json(self, &scope)
    }

    /// Export the subtree of `root` (or the whole store) to Graphviz DOT.
    ///
    /// # Errors
    ///
    /// Same as [`export_json`](Self::export_json).
    pub fn export_dot(&mut self, root: Option<ItemKey>, options: &DotOptions) -> Result<String> {
        let scope = self.export_scope(root)?;
        crate::export::export_dot(self, &scope, options)
    }

    fn export_scope(&mut self, root: Option<ItemKey>) -> Result<Vec<ItemKey>> {
        self.load_scope(root)?;
        let scope = self.tree.descendants(root);
        check_export_size(scope.len())?;
        Ok(scope)
    }

    // ========================================
    // Statistics
    // ========================================

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if no item is visible.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub(crate) fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    pub(crate) fn visible_items(&self) -> impl Iterator<Item = &ContentItem> + '_ {
        self.tree.members().filter_map(|key| self.items.get(&key))
    }

    fn require(&self, key: ItemKey) -> Result<&ContentItem> {
        if self.pending.is_deleted(key) {
            return Err(StoreError::not_found(key));
        }
        self.items.get(&key).ok_or_else(|| StoreError::not_found(key))
    }

    fn allocate_key(&mut self) -> ItemKey {
        let key = ItemKey::new(self.next_key);
        self.next_key += 1;
        key
    }
}
