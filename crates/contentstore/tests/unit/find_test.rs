//! Unit tests for parameter-based find and descendant search.

use contentstore::{ContentStore, DetailValue, ItemKey, Parameter, StoreError};

struct Site {
    root: ItemKey,
    news: ItemKey,
    about: ItemKey,
    teaser: ItemKey,
    archive: ItemKey,
    other_root: ItemKey,
}

/// root ─ news ─ archive
///      ├ about
///      └ teaser (Part)
/// other_root
fn site(store: &mut ContentStore) -> Site {
    let root = store.create("Page", "root", None).unwrap();
    let news = store.create("Page", "news", Some(root)).unwrap();
    let about = store.create("Page", "about", Some(root)).unwrap();
    let teaser = store.create("Part", "teaser", Some(root)).unwrap();
    let archive = store.create("Page", "archive", Some(news)).unwrap();
    let other_root = store.create("Page", "other", None).unwrap();

    store.item_mut(news).unwrap().set_detail("Featured", true);
    store.item_mut(about).unwrap().title = "About us".to_string();

    store.save(&[root, other_root]).unwrap();
    store.flush().unwrap();

    Site {
        root,
        news,
        about,
        teaser,
        archive,
        other_root,
    }
}

#[test]
fn test_find_class_and_parent() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    let pages = store
        .find(&[Parameter::class("Page"), Parameter::parent(Some(site.root))])
        .unwrap();

    assert_eq!(pages, vec![site.news, site.about]);
    assert!(!pages.contains(&site.teaser));
    assert!(!pages.contains(&site.archive));
}

#[test]
fn test_find_null_parent_means_root() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    let roots = store.find(&[Parameter::parent(None)]).unwrap();
    assert_eq!(roots, vec![site.root, site.other_root]);
}

#[test]
fn test_find_by_detail_and_fields() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    assert_eq!(
        store.find(&[Parameter::new("Featured", true)]).unwrap(),
        vec![site.news]
    );
    assert_eq!(
        store.find(&[Parameter::new("Title", "About us")]).unwrap(),
        vec![site.about]
    );
    assert_eq!(
        store.find(&[Parameter::new("Name", "archive")]).unwrap(),
        vec![site.archive]
    );

    let id = store.item(site.teaser).unwrap().id() as i64;
    assert_eq!(store.find(&[Parameter::new("ID", id)]).unwrap(), vec![site.teaser]);
}

#[test]
fn test_find_null_detail_matches_absent() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    let not_featured = store
        .find(&[Parameter::class("Page"), Parameter::new("Featured", DetailValue::Null)])
        .unwrap();
    assert!(!not_featured.contains(&site.news));
    assert_eq!(not_featured.len(), 4);
}

#[test]
fn test_find_rejects_malformed_parameters() {
    let mut store = ContentStore::in_memory().unwrap();
    site(&mut store);

    assert!(matches!(store.find(&[]), Err(StoreError::InvalidQuery { .. })));
    assert!(matches!(
        store.find(&[Parameter::new("class", 1i64)]),
        Err(StoreError::InvalidQuery { .. })
    ));
    assert!(matches!(
        store.find(&[Parameter::new("", "x")]),
        Err(StoreError::InvalidQuery { .. })
    ));
}

#[test]
fn test_find_descendants_by_discriminator() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    assert_eq!(
        store.find_descendants(Some(site.news), "Page").unwrap(),
        vec![site.news, site.archive]
    );
    assert_eq!(
        store.find_descendants(Some(site.root), "Part").unwrap(),
        vec![site.teaser]
    );
    assert_eq!(store.find_descendants(None, "Page").unwrap().len(), 5);
    assert!(store.find_descendants(Some(site.archive), "Part").unwrap().is_empty());
}

#[test]
fn test_tree_navigation() {
    let mut store = ContentStore::in_memory().unwrap();
    let site = site(&mut store);

    assert_eq!(
        store.children_of(site.root).unwrap(),
        vec![site.news, site.about, site.teaser]
    );
    assert_eq!(store.ancestors(site.archive).unwrap(), vec![site.news, site.root]);
    assert!(store.is_descendant_of(site.archive, Some(site.root)));
    assert!(store.is_descendant_of(site.root, Some(site.root)));
    assert!(!store.is_descendant_of(site.other_root, Some(site.root)));
    assert!(store.is_descendant_of(site.other_root, None));
}
