//! Store configuration.

/// Options controlling how a [`ContentStore`](crate::ContentStore) talks to its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Load every record when the store is opened instead of on demand.
    pub eager_load: bool,
    /// Call [`ContentBackend::sync`](crate::ContentBackend::sync) after each
    /// successful flush.
    pub sync_on_flush: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            eager_load: false,
            sync_on_flush: true,
        }
    }
}

impl StoreOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`eager_load`](Self::eager_load).
    pub fn with_eager_load(mut self, eager_load: bool) -> Self {
        self.eager_load = eager_load;
        self
    }

    /// Set [`sync_on_flush`](Self::sync_on_flush).
    pub fn with_sync_on_flush(mut self, sync_on_flush: bool) -> Self {
        self.sync_on_flush = sync_on_flush;
        self
    }
}
