//! JSON export.
//!
//! Generates an object with an "items" array (one entry per item, parent and
//! details included) and a "links" array (one entry per link slot).

use crate::item::{ContentItem, DetailValue, ItemKey};
use crate::{ContentStore, Result, StoreError};
use serde_json::{json, Value};

/// Export the given items of `store` to pretty-printed JSON.
///
/// Items are addressed by handle. Links whose target is outside `scope` are
/// still listed under "links".
pub fn export_json(store: &ContentStore, scope: &[ItemKey]) -> Result<String> {
    let mut items_array = Vec::new();
    let mut links_array = Vec::new();

    for key in scope {
        let item = store.item(*key)?;
        items_array.push(item_to_json(item));

        for (slot, target) in item.links() {
            links_array.push(json!({
                "source": key.raw(),
                "target": target.raw(),
                "slot": slot,
            }));
        }
    }

    let result = json!({
        "items": items_array,
        "links": links_array,
    });

    serde_json::to_string_pretty(&result)
        .map_err(|e| StoreError::serialization("Failed to serialize export", Some(e)))
}

/// Convert an item to a JSON object
fn item_to_json(item: &ContentItem) -> Value {
    let details: serde_json::Map<String, Value> = item
        .details
        .iter()
        .map(|(name, value)| (name.clone(), value_to_json(value)))
        .collect();

    let collections: serde_json::Map<String, Value> = item
        .detail_collections
        .iter()
        .map(|(name, values)| {
            let values: Vec<Value> = values.iter().map(value_to_json).collect();
            (name.clone(), Value::Array(values))
        })
        .collect();

    json!({
        "key": item.key().raw(),
        "id": item.id(),
        "discriminator": item.discriminator(),
        "name": item.name,
        "title": item.title,
        "parent": item.parent().map(|p| p.raw()),
        "details": details,
        "collections": collections,
    })
}

/// Convert a detail value; links become `{"link": <key>}`
fn value_to_json(value: &DetailValue) -> Value {
    match value {
        DetailValue::String(s) => json!(s),
        DetailValue::Int(i) => json!(i),
        DetailValue::Float(f) => json!(f),
        DetailValue::Bool(b) => json!(b),
        DetailValue::DateTime(d) => json!(d.to_rfc3339()),
        DetailValue::Link(target) => json!({ "link": target.raw() }),
        DetailValue::Null => Value::Null,
    }
}
