//! Content items and their details.
//!
//! This module defines the fundamental building blocks:
//! - [`ContentItem`]: a node in the content tree
//! - [`DetailValue`]: a primitive or a link to another item
//! - [`DetailMap`]: the single-valued details of an item

mod detail;
mod types;

pub use detail::{DetailCollections, DetailMap, DetailValue};
pub use types::{ContentItem, ItemId, ItemKey, TRANSIENT_ID};
