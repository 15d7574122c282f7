//! Error types for content store operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.

use thiserror::Error;

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Comprehensive error type for all store operations.
///
/// Structural errors are raised before anything is mutated, so a failed call
/// leaves the unit of work exactly as it was.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage backend error (RocksDB, lock poisoning, etc.)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Item handle is not known to the store
    #[error("Item not found: {item}")]
    ItemNotFound {
        /// Handle or id of the missing item
        item: String,
    },

    /// A staged item links to a transient item that is not part of the batch
    #[error("Dangling reference: {item} links to {target} through '{slot}', which is not persisted or staged")]
    DanglingReference {
        /// Referring item
        item: String,
        /// Unresolvable target
        target: String,
        /// Detail, collection or parent slot holding the link
        slot: String,
    },

    /// The backend rejected the commit; nothing in the batch was applied
    #[error("Commit failed: {message}")]
    CommitFailed {
        /// What was being committed
        message: String,
        /// Backend error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parent assignment would make an item its own ancestor
    #[error("Cycle in tree: {parent} is {item} or one of its descendants")]
    CycleInTree {
        /// Item being moved
        item: String,
        /// Rejected parent
        parent: String,
    },

    /// Malformed find parameters
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem
        message: String,
    },

    /// Invalid operation (e.g., deleting an item that still has children)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },
}

impl StoreError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Wrap a backend failure raised while committing a batch.
    pub fn commit_failed(message: impl Into<String>, source: StoreError) -> Self {
        Self::CommitFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn not_found(item: impl std::fmt::Display) -> Self {
        Self::ItemNotFound {
            item: item.to_string(),
        }
    }

    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }
}
