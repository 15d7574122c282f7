//! Derived indexes over the items held by a store.
//!
//! Both indexes are caches: they can be dropped and rebuilt from the item
//! arena at any time without losing information.

mod references;
mod tree;

pub use references::ReferenceIndex;
pub use tree::TreeIndex;
