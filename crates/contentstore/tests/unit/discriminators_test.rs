//! Unit tests for descendant discriminator aggregation.

use contentstore::{ContentStore, DiscriminatorCount, ItemKey};

/// Page root with a chain of three Part items below it.
fn page_with_part_chain(store: &mut ContentStore) -> ItemKey {
    let root = store.create("Page", "root", None).unwrap();
    let first = store.create("Part", "first", Some(root)).unwrap();
    let second = store.create("Part", "second", Some(first)).unwrap();
    store.create("Part", "third", Some(second)).unwrap();
    store.save(&[root]).unwrap();
    store.flush().unwrap();
    root
}

#[test]
fn test_part_chain_counts() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = page_with_part_chain(&mut store);

    assert_eq!(
        store.find_descendant_discriminators(Some(root)).unwrap(),
        vec![DiscriminatorCount::new("Part", 3), DiscriminatorCount::new("Page", 1)]
    );
}

#[test]
fn test_page_and_part_single_each() {
    let mut store = ContentStore::in_memory().unwrap();
    let r = store.create("Page", "r", None).unwrap();
    let c1 = store.create("Page", "c1", Some(r)).unwrap();
    store.create("Part", "c2", Some(c1)).unwrap();
    store.save(&[r]).unwrap();

    // Root counts as part of its own subtree
    assert_eq!(
        store.find_descendant_discriminators(Some(c1)).unwrap(),
        vec![DiscriminatorCount::new("Page", 1), DiscriminatorCount::new("Part", 1)]
    );
    assert_eq!(
        store.find_descendant_discriminators(Some(r)).unwrap(),
        vec![DiscriminatorCount::new("Page", 2), DiscriminatorCount::new("Part", 1)]
    );
}

#[test]
fn test_counts_sum_to_subtree_size_and_are_sorted() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = store.create("Folder", "root", None).unwrap();
    for i in 0..4 {
        let page = store.create("Page", format!("page{i}"), Some(root)).unwrap();
        for j in 0..i {
            store.create("Part", format!("part{i}.{j}"), Some(page)).unwrap();
        }
        store.create("Image", format!("image{i}"), Some(page)).unwrap();
    }
    store.save(&[root]).unwrap();

    let counts = store.find_descendant_discriminators(Some(root)).unwrap();
    let total: usize = counts.iter().map(|c| c.count).sum();
    let subtree = store.find_descendants(Some(root), "Page").unwrap().len()
        + store.find_descendants(Some(root), "Part").unwrap().len()
        + store.find_descendants(Some(root), "Image").unwrap().len()
        + 1;

    assert_eq!(total, subtree);
    assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
    assert!(counts.iter().all(|c| c.count >= 1));
}

#[test]
fn test_whole_store_scope() {
    let mut store = ContentStore::in_memory().unwrap();
    page_with_part_chain(&mut store);
    let other = store.create("Page", "other", None).unwrap();
    store.save(&[other]).unwrap();

    assert_eq!(
        store.find_descendant_discriminators(None).unwrap(),
        vec![DiscriminatorCount::new("Part", 3), DiscriminatorCount::new("Page", 2)]
    );
}

#[test]
fn test_equal_counts_ordered_by_name() {
    let mut store = ContentStore::in_memory().unwrap();
    let root = store.create("Zeta", "root", None).unwrap();
    store.create("Alpha", "a", Some(root)).unwrap();
    store.create("Mid", "m", Some(root)).unwrap();
    store.save(&[root]).unwrap();

    let names: Vec<_> = store
        .find_descendant_discriminators(Some(root))
        .unwrap()
        .into_iter()
        .map(|c| c.discriminator)
        .collect();
    assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
}

#[test]
fn test_unsaved_root_is_not_found() {
    let mut store = ContentStore::in_memory().unwrap();
    let draft = store.create("Page", "draft", None).unwrap();

    assert!(store.find_descendant_discriminators(Some(draft)).is_err());
}
