mod common;

use common::Host;
use primary_category_core::db::open_db_in_memory;
use primary_category_core::{
    CacheKey, ContentItem, ContentStore, EphemeralStore, MetaStore, RepoError, TermStore,
};
use std::time::Duration;

#[test]
fn assigned_terms_follow_assignment_order() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    host.term(9, "category", "alpha", "Alpha");
    host.term(2, "category", "zulu", "Zulu");
    host.term(5, "category", "mike", "Mike");
    let item = host.item("post", "ordered");

    host.assign(item.id, "category", &[2, 9, 5]);

    let ids: Vec<i64> = host
        .terms
        .assigned_terms(item.id, "category")
        .unwrap()
        .iter()
        .map(|term| term.id)
        .collect();
    assert_eq!(ids, vec![2, 9, 5]);
}

#[test]
fn set_item_terms_only_replaces_one_taxonomy() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    host.term(1, "category", "news", "News");
    host.term(2, "post_tag", "breaking", "Breaking");
    host.term(3, "category", "sports", "Sports");
    let item = host.item("post", "mixed");
    host.assign(item.id, "category", &[1]);
    host.assign(item.id, "post_tag", &[2]);

    host.assign(item.id, "category", &[3]);

    let categories = host.terms.assigned_terms(item.id, "category").unwrap();
    let tags = host.terms.assigned_terms(item.id, "post_tag").unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].slug, "sports");
    assert_eq!(tags.len(), 1);
}

#[test]
fn set_item_terms_rejects_terms_from_other_taxonomy() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    host.term(1, "category", "news", "News");
    host.term(2, "post_tag", "breaking", "Breaking");
    let item = host.item("post", "strict");
    host.assign(item.id, "category", &[1]);

    let err = host
        .terms
        .set_item_terms(item.id, "category", &[1, 2])
        .unwrap_err();
    assert!(matches!(err, RepoError::TermNotFound(2)));

    // Rolled back: the previous assignment survives.
    assert_eq!(host.terms.assigned_terms(item.id, "category").unwrap().len(), 1);
}

#[test]
fn deleting_a_term_cascades_assignments() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    host.term(1, "category", "news", "News");
    host.term(2, "category", "sports", "Sports");
    let item = host.item("post", "cascade");
    host.assign(item.id, "category", &[1, 2]);

    host.terms.delete_term(1).unwrap();

    let remaining = host.terms.assigned_terms(item.id, "category").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, 2);
    assert!(matches!(
        host.terms.delete_term(1).unwrap_err(),
        RepoError::TermNotFound(1)
    ));
}

#[test]
fn unknown_taxonomy_is_not_hierarchical() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);

    assert!(host.terms.is_hierarchical("category").unwrap());
    assert!(!host.terms.is_hierarchical("post_tag").unwrap());
    assert!(!host.terms.is_hierarchical("genre").unwrap());
}

#[test]
fn create_term_requires_registered_taxonomy() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);

    let err = host.terms.create_term("genre", "jazz", "Jazz").unwrap_err();
    assert!(matches!(err, RepoError::TaxonomyNotFound(name) if name == "genre"));
}

#[test]
fn items_are_found_by_type_and_slug() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let post = host.item("post", "shared-slug");
    let event = host.item("event", "shared-slug");

    let found = host.items.find_by_slug("event", "shared-slug").unwrap();
    assert_eq!(found, Some(event));
    assert_eq!(host.items.get_item(post.id).unwrap(), Some(post));
    assert_eq!(host.items.find_by_slug("page", "shared-slug").unwrap(), None);
}

#[test]
fn create_item_rejects_path_like_slugs() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);

    let err = host
        .items
        .create_item(&ContentItem::new("post", "a/b"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn meta_upserts_and_deletes_by_value() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let first = host.item("post", "first");
    let second = host.item("post", "second");

    host.meta.set_meta(first.id, "_key", "1").unwrap();
    host.meta.set_meta(first.id, "_key", "7").unwrap();
    host.meta.set_meta(second.id, "_key", "7").unwrap();
    assert_eq!(
        host.meta.get_meta(first.id, "_key").unwrap().as_deref(),
        Some("7")
    );

    let mut selecting = host.meta.items_with_meta_value("_key", "7").unwrap();
    selecting.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(selecting, expected);

    assert_eq!(host.meta.delete_meta_by_value("_key", "7").unwrap(), 2);
    assert_eq!(host.meta.get_meta(second.id, "_key").unwrap(), None);
    assert!(!host.meta.delete_meta(first.id, "_key").unwrap());
}

#[test]
fn meta_write_for_missing_item_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let ghost = ContentItem::new("post", "ghost");

    let err = host.meta.set_meta(ghost.id, "_key", "1").unwrap_err();
    assert!(matches!(err, RepoError::ItemNotFound(id) if id == ghost.id));
}

#[test]
fn sqlite_transients_expire_lazily() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let item = host.item("post", "cached");
    let live = CacheKey::new("live", item.id);
    let stale = CacheKey::new("stale", item.id);

    host.cache.set(&live, "kept", Duration::from_secs(60)).unwrap();
    host.cache.set(&stale, "dropped", Duration::ZERO).unwrap();

    assert_eq!(host.cache.get(&live).unwrap().as_deref(), Some("kept"));
    assert_eq!(host.cache.get(&stale).unwrap(), None);

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM transients;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    host.cache.delete(&live).unwrap();
    assert_eq!(host.cache.get(&live).unwrap(), None);
}
