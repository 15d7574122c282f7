//! # contentstore
//!
//! A hierarchical content repository: items form a tree, carry typed details
//! and link to each other freely, including cycles and self-links.
//!
//! ## Core Principles
//!
//! - **Explicit Writes**: changes are staged with `save`/`delete` and
//!   committed atomically with `flush`
//! - **Stable Handles**: items are addressed by [`ItemKey`] in memory and by
//!   [`ItemId`] once persisted
//! - **Open Types**: a discriminator is plain data, not a Rust type
//! - **Subtree Queries**: descendant search, discriminator counts and
//!   reference removal work on any subtree
//! - **Pluggable Persistence**: RocksDB or memory behind [`ContentBackend`]
//!
//! ## Architecture
//!
//! ```text
//! Query Facade (ContentStore, QueryBuilder)
//!     ↓
//! Indexes (tree, references) + Discriminator Aggregator
//!     ↓
//! Item Store (arena, identity map, unit of work)
//!     ↓
//! Storage Backend (RocksDB, memory)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use contentstore::{ContentStore, Parameter};
//!
//! # fn main() -> contentstore::Result<()> {
//! let mut store = ContentStore::in_memory()?;
//!
//! let home = store.create("Page", "home", None)?;
//! let news = store.create("Page", "news", Some(home))?;
//! let teaser = store.create("Part", "teaser", Some(home))?;
//! store.item_mut(teaser)?.set_detail("Target", news);
//!
//! store.save(&[home])?;
//! store.flush()?;
//!
//! let pages = store.find(&[Parameter::class("Page"), Parameter::parent(Some(home))])?;
//! assert_eq!(pages, vec![news]);
//! assert_eq!(store.find_referencing(news)?, vec![teaser]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod discriminators;
pub mod error;
pub mod export;
pub mod index;
pub mod item;
pub mod query;
pub mod storage;
pub mod store;

// Re-export main types
pub use discriminators::DiscriminatorCount;
pub use error::{Result, StoreError};
pub use export::DotOptions;
pub use index::{ReferenceIndex, TreeIndex};
pub use item::{
    ContentItem, DetailCollections, DetailMap, DetailValue, ItemId, ItemKey, TRANSIENT_ID,
};
pub use query::{Parameter, QueryBuilder};
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
pub use storage::{CommitBatch, ContentBackend, ItemRecord, MemoryBackend};
pub use store::{ChangeSummary, ContentStore, StoreOptions};
