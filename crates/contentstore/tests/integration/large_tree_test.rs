//! Integration test for large content trees.

use contentstore::{ContentStore, ItemKey, MemoryBackend};
use std::time::Instant;

/// Build `sections` pages under a root, each with `parts` parts that link to
/// the next section.
fn build_site(store: &mut ContentStore, sections: usize, parts: usize) -> (ItemKey, Vec<ItemKey>) {
    let root = store.create("Site", "root", None).unwrap();
    let pages: Vec<_> = (0..sections)
        .map(|i| store.create("Page", format!("section-{i}"), Some(root)).unwrap())
        .collect();

    for (i, page) in pages.iter().enumerate() {
        let next = pages[(i + 1) % sections];
        for j in 0..parts {
            let part = store.create("Part", format!("part-{i}-{j}"), Some(*page)).unwrap();
            store.item_mut(part).unwrap().set_detail("Next", next);
        }
    }

    store.save(&[root]).unwrap();
    store.flush().unwrap();
    (root, pages)
}

#[test]
fn test_large_tree_queries() {
    let backend = MemoryBackend::new();
    let mut store = ContentStore::with_backend(Box::new(backend.clone())).unwrap();
    let (root, pages) = build_site(&mut store, 100, 50);

    assert_eq!(store.len(), 1 + 100 + 100 * 50);
    assert_eq!(backend.len(), store.len());

    let start = Instant::now();
    let counts = store.find_descendant_discriminators(Some(root)).unwrap();
    assert_eq!(counts[0].count, 5000);
    assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), store.len());

    assert_eq!(store.find_descendants(Some(pages[7]), "Part").unwrap().len(), 50);
    assert_eq!(store.find_referencing(pages[8]).unwrap().len(), 50);
    println!("Large tree queries took {:?}", start.elapsed());
}

#[test]
fn test_large_tree_reference_removal_and_reload() {
    let backend = MemoryBackend::new();
    let (pages_ids, removed) = {
        let mut store = ContentStore::with_backend(Box::new(backend.clone())).unwrap();
        let (_, pages) = build_site(&mut store, 20, 10);

        let removed = store.remove_references_to_recursive(pages[3]).unwrap();
        store.flush().unwrap();

        let ids: Vec<_> = pages.iter().map(|p| store.item(*p).unwrap().id()).collect();
        (ids, removed)
    };

    // Parts of section 2 pointed at section 3
    assert_eq!(removed, 10);

    let mut store = ContentStore::with_backend(Box::new(backend)).unwrap();
    let section3 = store.get(pages_ids[3]).unwrap().unwrap().key();
    assert!(store.find_referencing(section3).unwrap().is_empty());

    let section4 = store.key_of(pages_ids[4]).unwrap();
    assert_eq!(store.find_referencing(section4).unwrap().len(), 10);
}
