//! Unit tests for detail values and detail maps.

use chrono::{TimeZone, Utc};
use contentstore::{ContentStore, DetailMap, DetailValue, ItemKey};

#[test]
fn test_detail_map_typed_getters() {
    let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let details: DetailMap = DetailMap::new()
        .with("Text", "Hello")
        .with("Views", 42i64)
        .with("Rating", 4.5)
        .with("Visible", true)
        .with("Published", published);

    assert_eq!(details.get_string("Text"), Some("Hello"));
    assert_eq!(details.get_int("Views"), Some(42));
    assert_eq!(details.get_float("Rating"), Some(4.5));
    assert_eq!(details.get_bool("Visible"), Some(true));
    assert_eq!(details.get_datetime("Published"), Some(published));
    assert_eq!(details.get_string("Views"), None);
    assert_eq!(details.len(), 5);
}

#[test]
fn test_null_removes_detail() {
    let mut details: DetailMap = DetailMap::new().with("Text", "Hello");
    details.insert("Text", DetailValue::Null);

    assert!(details.is_empty());
    assert!(!details.contains_key("Text"));
}

#[test]
fn test_links_and_values_on_items() {
    let mut store = ContentStore::in_memory().unwrap();
    let page = store.create("Page", "home", None).unwrap();
    let other = store.create("Page", "other", None).unwrap();

    let item = store.item_mut(page).unwrap();
    item.set_detail("Link", other);
    item.collection_mut("Tags").push("news".into());
    item.collection_mut("Tags").push("sport".into());

    let item = store.item(page).unwrap();
    assert_eq!(item.details.get_link("Link"), Some(&other));
    assert_eq!(
        item.collection("Tags"),
        Some(&[DetailValue::String("news".into()), DetailValue::String("sport".into())][..])
    );
    assert_eq!(item.links().collect::<Vec<_>>(), vec![("Link", other)]);
}

#[test]
fn test_value_type_names() {
    assert_eq!(DetailValue::<ItemKey>::from("x").type_name(), "string");
    assert_eq!(DetailValue::<ItemKey>::from(1i64).type_name(), "int");
    assert_eq!(DetailValue::<ItemKey>::Null.type_name(), "null");
}
