//! Translation between in-memory items (linked by handle) and stored
//! records (linked by id).

use crate::error::{Result, StoreError};
use crate::item::{ContentItem, DetailCollections, ItemId, ItemKey};
use crate::storage::ItemRecord;
use log::warn;

/// Build the stored form of `item` under `id`.
///
/// # Errors
///
/// Returns [`StoreError::DanglingReference`] naming the first parent or link
/// that `resolve` cannot map to an id.
pub(crate) fn to_record(
    item: &ContentItem,
    id: ItemId,
    resolve: impl Fn(ItemKey) -> Option<ItemId>,
) -> Result<ItemRecord> {
    let dangling = |slot: &str, target: ItemKey| StoreError::DanglingReference {
        item: item.key().to_string(),
        target: target.to_string(),
        slot: slot.to_string(),
    };

    let parent = match item.parent() {
        Some(parent) => Some(resolve(parent).ok_or_else(|| dangling("Parent", parent))?),
        None => None,
    };

    let details = item
        .details
        .clone()
        .try_map_links(|slot, target| resolve(target).ok_or_else(|| dangling(slot, target)))?;

    let mut detail_collections = DetailCollections::new();
    for (name, values) in &item.detail_collections {
        let mapped = values
            .iter()
            .cloned()
            .map(|value| {
                value.try_map_link(|target| {
                    resolve(target).ok_or_else(|| dangling(name.as_str(), target))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        detail_collections.insert(name.clone(), mapped);
    }

    Ok(ItemRecord {
        id,
        discriminator: item.discriminator().to_string(),
        title: item.title.clone(),
        name: item.name.clone(),
        parent,
        details,
        detail_collections,
    })
}

/// Rebuild an item from its stored form.
///
/// Links to ids that `resolve` does not know are dropped with a warning.
pub(crate) fn from_record(
    key: ItemKey,
    record: ItemRecord,
    resolve: impl Fn(ItemId) -> Option<ItemKey>,
) -> ContentItem {
    let parent = record.parent.and_then(|id| {
        let key = resolve(id);
        if key.is_none() {
            warn!("Item {} has missing parent {id}; loading it as a root", record.id);
        }
        key
    });

    let mut item = ContentItem::restore(key, record.id, record.discriminator, parent);
    item.title = record.title;
    item.name = record.name;

    for (name, value) in record.details.iter() {
        match value.clone().try_map_link(|id| resolve(id).ok_or(id)) {
            Ok(value) => item.details.insert(name.clone(), value),
            Err(id) => warn!("Dropping detail '{name}' of item {}: target {id} is missing", record.id),
        }
    }

    for (name, values) in record.detail_collections {
        let collection = item.collection_mut(name.clone());
        for value in values {
            match value.try_map_link(|id| resolve(id).ok_or(id)) {
                Ok(value) => collection.push(value),
                Err(id) => warn!(
                    "Dropping entry of collection '{name}' of item {}: target {id} is missing",
                    record.id
                ),
            }
        }
    }

    item
}
