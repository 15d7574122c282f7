//! Per-discriminator item counts.

use crate::item::ContentItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of items sharing a discriminator within a query scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminatorCount {
    /// Type tag
    pub discriminator: String,
    /// Items carrying the tag, at least 1
    pub count: usize,
}

impl DiscriminatorCount {
    /// Create a count entry.
    pub fn new(discriminator: impl Into<String>, count: usize) -> Self {
        Self {
            discriminator: discriminator.into(),
            count,
        }
    }
}

/// Group `items` by discriminator.
///
/// Sorted by count descending; equal counts are ordered by discriminator
/// name ascending.
pub fn aggregate<'a>(items: impl IntoIterator<Item = &'a ContentItem>) -> Vec<DiscriminatorCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item.discriminator()).or_default() += 1;
    }

    let mut result: Vec<_> = counts
        .into_iter()
        .map(|(discriminator, count)| DiscriminatorCount::new(discriminator, count))
        .collect();
    result.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.discriminator.cmp(&b.discriminator))
    });
    result
}
