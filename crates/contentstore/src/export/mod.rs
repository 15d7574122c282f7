//! Export module for inspecting content trees in external tools.
//!
//! Supports two formats:
//! - **DOT**: Graphviz visualization of the tree and its links
//! - **JSON**: items with their details, for scripts and web tools

pub mod dot;
pub mod json;

pub use dot::{export_dot, DotOptions};
pub use json::export_json;

use crate::error::{Result, StoreError};
use log::warn;

/// Exports above this many items are refused.
pub const MAX_EXPORT_ITEMS: usize = 100_000;

/// Exports above this many items log a warning.
pub const WARN_EXPORT_ITEMS: usize = 10_000;

/// Check the size of an export scope.
///
/// # Errors
///
/// Returns [`StoreError::InvalidOperation`] above [`MAX_EXPORT_ITEMS`].
pub(crate) fn check_export_size(item_count: usize) -> Result<()> {
    if item_count > MAX_EXPORT_ITEMS {
        return Err(StoreError::InvalidOperation {
            message: format!(
                "Scope too large for export ({item_count} items > {MAX_EXPORT_ITEMS} limit). Export a subtree instead."
            ),
        });
    }

    if item_count > WARN_EXPORT_ITEMS {
        warn!("Exporting large scope ({item_count} items). Consider exporting a subtree.");
    }

    Ok(())
}
