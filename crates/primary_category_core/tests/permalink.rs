mod common;

use common::{Host, BASE_URL};
use primary_category_core::db::open_db_in_memory;
use primary_category_core::{
    ContentTypeRegistration, HostStores, ItemId, PermalinkRewriter, PrimaryCategoryEngine,
    PrimaryCategoryResolver, RepoError, RepoResult, RewriteConfig, SqliteTermStore, Term, TermId,
    TermStore,
};
use std::cell::Cell;

#[test]
fn default_type_path_follows_selection() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = host.config();
    let engine = PrimaryCategoryEngine::new(&config, host.stores());
    host.term(5, "category", "news", "News");
    host.term(7, "category", "sports", "Sports");
    let item = host.item("post", "p1-slug");
    host.assign(item.id, "category", &[5, 7]);

    assert_eq!(engine.build_path(&item), format!("{BASE_URL}/news/p1-slug/"));

    engine.resolver().set_selection(item.id, Some(7)).unwrap();

    assert_eq!(engine.build_path(&item), "https://example.com/sports/p1-slug/");
}

#[test]
fn custom_type_with_single_term_substitutes_placeholder() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = host.config();
    let engine = PrimaryCategoryEngine::new(&config, host.stores());
    host.term(3, "event_category", "music", "Music");
    let item = host.item("event", "summer-fest");
    host.assign(item.id, "event_category", &[3]);

    assert!(!engine.resolver().is_active(item.id).unwrap());
    assert_eq!(
        engine.build_path(&item),
        "https://example.com/event/event_category/music/summer-fest/"
    );
}

#[test]
fn uncategorized_items_keep_host_permalink() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = host.config();
    let engine = PrimaryCategoryEngine::new(&config, host.stores());
    let post = host.item("post", "loose");
    let event = host.item("event", "orphan");
    let page = host.item("page", "about");

    assert_eq!(engine.build_path(&post), "https://example.com/loose/");
    assert_eq!(
        engine.build_path(&event),
        "https://example.com/event/event_category//orphan/"
    );
    assert_eq!(engine.build_path(&page), "https://example.com/page/about/");
}

#[test]
fn rewrite_substitutes_only_the_taxonomy_placeholder() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = RewriteConfig::builder(BASE_URL)
        .content_type(
            ContentTypeRegistration::new("event", ["event_category"])
                .with_permalink_template("/shows/%event_category%/%postname%.html"),
        )
        .build(&host.terms)
        .unwrap();
    let resolver = PrimaryCategoryResolver::new(&config, host.stores());
    let rewriter = PermalinkRewriter::new(&resolver);
    host.term(3, "event_category", "music", "Music");
    let item = host.item("event", "gig");
    host.assign(item.id, "event_category", &[3]);

    assert_eq!(
        rewriter.host_permalink(&item),
        "https://example.com/shows/%event_category%/gig.html"
    );
    assert_eq!(
        rewriter.build_path(&item),
        "https://example.com/shows/music/gig.html"
    );
    assert_eq!(
        rewriter.rewrite(&item, "https://cdn.example.com/%event_category%/%event_tag%/gig"),
        "https://cdn.example.com/music/%event_tag%/gig"
    );
}

/// Fails the first `assigned_terms` call, then delegates.
struct FlakyTerms<'c> {
    inner: SqliteTermStore<'c>,
    failures_left: Cell<u32>,
}

impl TermStore for FlakyTerms<'_> {
    fn assigned_terms(&self, item_id: ItemId, taxonomy: &str) -> RepoResult<Vec<Term>> {
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(RepoError::InvalidData("term store offline".to_string()));
        }
        self.inner.assigned_terms(item_id, taxonomy)
    }

    fn get_term(&self, term_id: TermId, taxonomy: &str) -> RepoResult<Option<Term>> {
        self.inner.get_term(term_id, taxonomy)
    }

    fn get_term_by_slug(&self, slug: &str, taxonomy: &str) -> RepoResult<Option<Term>> {
        self.inner.get_term_by_slug(slug, taxonomy)
    }

    fn is_hierarchical(&self, taxonomy: &str) -> RepoResult<bool> {
        self.inner.is_hierarchical(taxonomy)
    }
}

#[test]
fn failed_resolution_uses_last_assigned_term_for_custom_types() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = host.config();
    host.term(3, "event_category", "music", "Music");
    host.term(4, "event_category", "theatre", "Theatre");
    let item = host.item("event", "double-bill");
    host.assign(item.id, "event_category", &[3, 4]);
    let flaky = FlakyTerms {
        inner: SqliteTermStore::new(&conn),
        failures_left: Cell::new(1),
    };
    let stores = HostStores {
        terms: &flaky,
        ..host.stores()
    };
    let engine = PrimaryCategoryEngine::new(&config, stores);

    assert_eq!(
        engine.build_path(&item),
        "https://example.com/event/event_category/theatre/double-bill/"
    );
    // Recovered store: regular resolution picks the first term.
    assert_eq!(
        engine.build_path(&item),
        "https://example.com/event/event_category/music/double-bill/"
    );
}

#[test]
fn failed_resolution_keeps_host_permalink_for_default_type() {
    let conn = open_db_in_memory().unwrap();
    let host = Host::seeded(&conn);
    let config = host.config();
    host.term(5, "category", "news", "News");
    let item = host.item("post", "offline");
    host.assign(item.id, "category", &[5]);
    let flaky = FlakyTerms {
        inner: SqliteTermStore::new(&conn),
        failures_left: Cell::new(1),
    };
    let stores = HostStores {
        terms: &flaky,
        ..host.stores()
    };
    let engine = PrimaryCategoryEngine::new(&config, stores);

    assert_eq!(engine.build_path(&item), "https://example.com/offline/");
}
