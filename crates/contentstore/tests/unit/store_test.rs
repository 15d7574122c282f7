//! Unit tests for the item store: staging, flushing, loading and deleting.

use contentstore::{
    ContentBackend, ContentStore, DetailValue, DotOptions, MemoryBackend, StoreError, TRANSIENT_ID,
};

#[test]
fn test_save_flush_get_round_trip() {
    let mut store = ContentStore::in_memory().unwrap();
    let page = store.create("Page", "home", None).unwrap();
    {
        let item = store.item_mut(page).unwrap();
        item.title = "Welcome".to_string();
        item.set_detail("Views", 3i64);
        item.collection_mut("Tags").push("a".into());
        item.collection_mut("Tags").push("b".into());
    }
    store.save(&[page]).unwrap();
    store.flush().unwrap();

    let id = store.item(page).unwrap().id();
    assert_ne!(id, TRANSIENT_ID);

    let expected = store.item(page).unwrap().clone();
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded, &expected);
    assert_eq!(loaded.title, "Welcome");
    assert_eq!(
        loaded.collection("Tags"),
        Some(&[DetailValue::String("a".into()), DetailValue::String("b".into())][..])
    );
}

#[test]
fn test_delete_then_get_returns_none() {
    let mut store = ContentStore::in_memory().unwrap();
    let page = store.create("Page", "home", None).unwrap();
    store.save(&[page]).unwrap();
    store.flush().unwrap();
    let id = store.item(page).unwrap().id();

    store.delete(page).unwrap();
    assert!(store.get(id).unwrap().is_none());

    store.flush().unwrap();
    assert!(store.get(id).unwrap().is_none());
    assert!(store.is_empty());
}

#[test]
fn test_get_unknown_and_transient_ids() {
    let mut store = ContentStore::in_memory().unwrap();
    assert!(store.get(TRANSIENT_ID).unwrap().is_none());
    assert!(store.get(404).unwrap().is_none());
}

#[test]
fn test_discriminator_survives_updates() {
    let mut store = ContentStore::in_memory().unwrap();
    let part = store.create("Part", "intro", None).unwrap();
    for round in 0..3i64 {
        store.item_mut(part).unwrap().set_detail("Round", round);
        store.save(&[part]).unwrap();
        store.flush().unwrap();
        assert_eq!(store.item(part).unwrap().discriminator(), "Part");
    }
    assert_eq!(store.item(part).unwrap().id(), 1);
}

#[test]
fn test_delete_with_children_is_refused() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = store.create("Page", "root", None).unwrap();
    store.create("Page", "child", Some(root)).unwrap();
    store.save(&[root]).unwrap();
    store.flush().unwrap();

    assert!(matches!(
        store.delete(root),
        Err(StoreError::InvalidOperation { .. })
    ));
    assert_eq!(store.pending_changes().total(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_delete_recursive() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = store.create("Page", "root", None).unwrap();
    let child = store.create("Page", "child", Some(root)).unwrap();
    store.create("Part", "grandchild", Some(child)).unwrap();
    let keep = store.create("Page", "keep", None).unwrap();
    store.save(&[root, keep]).unwrap();
    store.flush().unwrap();

    assert_eq!(store.delete_recursive(root).unwrap(), 3);
    assert_eq!(store.pending_changes().deletes, 3);
    store.flush().unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.item(keep).is_ok());
    assert!(store.item(child).is_err());
}

#[test]
fn test_delete_unknown_item() {
    let mut store = ContentStore::in_memory().unwrap();
    let page = store.create("Page", "home", None).unwrap();
    store.save(&[page]).unwrap();
    store.delete(page).unwrap();

    assert!(matches!(store.delete(page), Err(StoreError::ItemNotFound { .. })));
}

#[test]
fn test_move_is_indexed_on_save() {
    let mut store = ContentStore::in_memory().unwrap();
    let a = store.create("Page", "a", None).unwrap();
    let b = store.create("Page", "b", None).unwrap();
    let c = store.create("Page", "c", Some(a)).unwrap();
    store.save(&[a, b]).unwrap();
    store.flush().unwrap();

    store.set_parent(c, Some(b)).unwrap();
    assert!(store.is_descendant_of(c, Some(a)));

    store.save(&[c]).unwrap();
    assert!(store.is_descendant_of(c, Some(b)));
    assert!(!store.is_descendant_of(c, Some(a)));
    assert_eq!(store.pending_changes().updates, 1);
}

#[test]
fn test_cycle_is_rejected_before_indexing() {
    let mut store = ContentStore::in_memory().unwrap();
    let a = store.create("Page", "a", None).unwrap();
    let b = store.create("Page", "b", Some(a)).unwrap();
    let c = store.create("Page", "c", Some(b)).unwrap();
    store.save(&[a]).unwrap();

    let err = store.set_parent(a, Some(c)).unwrap_err();
    assert!(matches!(err, StoreError::CycleInTree { .. }));
    assert_eq!(store.ancestors(c).unwrap(), vec![b, a]);
}

#[test]
fn test_unsaved_move_cannot_close_a_loop_on_save() {
    let backend = MemoryBackend::new();
    let mut store = ContentStore::with_backend(Box::new(backend.clone())).unwrap();
    let a = store.create("Page", "a", None).unwrap();
    let b = store.create("Page", "b", Some(a)).unwrap();
    store.save(&[a]).unwrap();
    store.flush().unwrap();

    // `b` is a root in memory only; the saved tree still has it under `a`
    store.set_parent(b, None).unwrap();
    store.set_parent(a, Some(b)).unwrap();

    let err = store.save(&[a]).unwrap_err();
    assert!(matches!(err, StoreError::CycleInTree { .. }));
    assert_eq!(store.pending_changes().total(), 0);
    assert!(store.is_descendant_of(b, Some(a)));
    assert!(!store.is_descendant_of(a, Some(b)));

    store.flush().unwrap();
    assert_eq!(backend.load_by_id(1).unwrap().unwrap().parent, None);
    assert_eq!(backend.load_by_id(2).unwrap().unwrap().parent, Some(1));

    // Saving both moves together yields a consistent tree
    store.save(&[a, b]).unwrap();
    store.flush().unwrap();
    assert!(store.is_descendant_of(a, Some(b)));
    assert_eq!(backend.load_by_id(1).unwrap().unwrap().parent, Some(2));
    assert_eq!(backend.load_by_id(2).unwrap().unwrap().parent, None);
}

#[test]
fn test_dangling_reference_blocks_flush() {
    let mut store = ContentStore::in_memory().unwrap();
    let a = store.create("Page", "a", None).unwrap();
    store.save(&[a]).unwrap();
    store.flush().unwrap();

    let ghost = store.create("Page", "ghost", None).unwrap();
    store.item_mut(a).unwrap().collection_mut("Related").push(ghost.into());
    store.save(&[a]).unwrap();
    // Saving `a` staged `ghost` along with it
    store.flush().unwrap();
    assert!(!store.item(ghost).unwrap().is_transient());

    let late = store.create("Page", "late", None).unwrap();
    store.save(&[a]).unwrap();
    store.item_mut(a).unwrap().set_detail("Late", late);

    match store.flush() {
        Err(StoreError::DanglingReference { slot, .. }) => assert_eq!(slot, "Late"),
        other => panic!("expected dangling reference, got {other:?}"),
    }
    assert_eq!(store.pending_changes().updates, 1);
}

#[test]
fn test_export_formats() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = store.create("Page", "root", None).unwrap();
    let part = store.create("Part", "part", Some(root)).unwrap();
    store.item_mut(part).unwrap().set_detail("Target", root);
    store.save(&[root]).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&store.export_json(Some(root)).unwrap()).unwrap();
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["links"][0]["slot"], "Target");

    let options = DotOptions::default().with_color("Part", "#90CAF9");
    let dot = store.export_dot(None, &options).unwrap();
    assert!(dot.starts_with("digraph content {"));
    assert!(dot.contains(&format!("n{} -> n{};", root.raw(), part.raw())));
    assert!(dot.contains("style=dashed"));
    assert!(dot.contains("#90CAF9"));
}
